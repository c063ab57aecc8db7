//! CoordinatorHandle - control-plane client for a running coordinator

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::messages::{CoordRequest, CoordinatorMetrics};
use super::shutdown::ShutdownToken;
use crate::domain::{JobDescriptor, RegistrationRecord, ResourceId};

/// Handle for interacting with a running coordinator
///
/// Cloneable; all operations are async. Requests travel the same queue as
/// transport deliveries, so they observe registry state in arrival order.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordRequest>,
    shutdown: ShutdownToken,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::Sender<CoordRequest>, shutdown: ShutdownToken) -> Self {
        Self { tx, shutdown }
    }

    /// Submit a job; returns the assigned opaque job id
    pub async fn submit_job(&self, descriptor: JobDescriptor) -> Result<String> {
        debug!(name = %descriptor.name, "CoordinatorHandle::submit_job: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(CoordRequest::SubmitJob {
                descriptor,
                reply: reply_tx,
            })
            .await
            .map_err(|_| eyre!("coordinator channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("coordinator shutdown before reply"))
    }

    /// Fetch a copy of the registry record for `id`
    pub async fn resource(&self, id: ResourceId) -> Result<Option<RegistrationRecord>> {
        debug!(resource = %id, "CoordinatorHandle::resource: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(CoordRequest::GetResource { id, reply: reply_tx })
            .await
            .map_err(|_| eyre!("coordinator channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("coordinator shutdown before reply"))
    }

    /// Snapshot current coordinator metrics
    pub async fn metrics(&self) -> Result<CoordinatorMetrics> {
        debug!("CoordinatorHandle::metrics: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(CoordRequest::GetMetrics { reply: reply_tx })
            .await
            .map_err(|_| eyre!("coordinator channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("coordinator shutdown before reply"))
    }

    /// Request shutdown; observed at the loop's next loop-top check
    pub fn shutdown(&self, reason: impl Into<String>) {
        self.shutdown.trigger(reason);
    }

    /// Token backing this handle's shutdown control
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }
}
