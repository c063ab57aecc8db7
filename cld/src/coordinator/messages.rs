//! Request types consumed by the coordinator's event loop

use serde::Serialize;
use tokio::sync::oneshot;

use crate::domain::{JobDescriptor, RegistrationRecord, ResourceId};
use crate::transport::Delivery;

/// Requests drained by the coordinator task
///
/// Everything that touches registry state travels through this single
/// bounded queue, which is why the registry needs no locking. Transport
/// completions and control requests interleave in arrival order.
#[derive(Debug)]
pub enum CoordRequest {
    /// Decoded message (or receive failure) from the transport
    Delivery(Delivery),

    /// Submit a job; replies with the assigned opaque job id
    SubmitJob {
        descriptor: JobDescriptor,
        reply: oneshot::Sender<String>,
    },

    /// Fetch a copy of one registry record
    GetResource {
        id: ResourceId,
        reply: oneshot::Sender<Option<RegistrationRecord>>,
    },

    /// Snapshot current metrics
    GetMetrics {
        reply: oneshot::Sender<CoordinatorMetrics>,
    },
}

/// Coordinator metrics for observability
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinatorMetrics {
    #[serde(rename = "known-resources")]
    pub known_resources: usize,

    #[serde(rename = "envelopes-dispatched")]
    pub envelopes_dispatched: u64,

    /// Envelopes carrying no recognized payload kind (not an error)
    #[serde(rename = "empty-envelopes")]
    pub empty_envelopes: u64,

    #[serde(rename = "registrations-new")]
    pub registrations_new: u64,

    /// Registrations from identities already tracked (possible recovery)
    #[serde(rename = "registrations-known")]
    pub registrations_known: u64,

    #[serde(rename = "heartbeats-refreshed")]
    pub heartbeats_refreshed: u64,

    #[serde(rename = "heartbeats-unknown")]
    pub heartbeats_unknown: u64,

    /// Transport receive failures, logged and dropped
    #[serde(rename = "receive-errors")]
    pub receive_errors: u64,

    #[serde(rename = "jobs-submitted")]
    pub jobs_submitted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_serialize_kebab_case() {
        let metrics = CoordinatorMetrics {
            known_resources: 2,
            heartbeats_unknown: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("known-resources"));
        assert!(json.contains("heartbeats-unknown"));
    }
}
