//! Control-plane message envelope and payload kinds
//!
//! An [`Envelope`] is one decoded message from a resource. Payload kinds
//! are optional and coexisting: a single envelope may carry a registration,
//! a heartbeat, both, or neither. Dispatch iterates [`Envelope::kinds`] in
//! [`PayloadKind::DISPATCH_ORDER`], so a heartbeat coexisting with a
//! registration always sees the freshly created record.

use serde::{Deserialize, Serialize};

use crate::domain::ResourceDescriptor;

/// Recognized payload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Registration,
    Heartbeat,
}

impl PayloadKind {
    /// Canonical order for kinds coexisting in one envelope
    pub const DISPATCH_ORDER: [PayloadKind; 2] = [PayloadKind::Registration, PayloadKind::Heartbeat];
}

/// Registration request from a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationMessage {
    /// String-form resource identity
    #[serde(rename = "resource-id")]
    pub resource_id: String,

    /// Capability metadata, copied into the registry on first registration
    #[serde(rename = "resource-descriptor", default)]
    pub descriptor: ResourceDescriptor,
}

/// Liveness refresh from a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    /// String-form resource identity
    #[serde(rename = "resource-id")]
    pub resource_id: String,
}

/// One decoded message from the transport
///
/// Unrecognized fields are tolerated on decode, so envelopes carrying only
/// future payload kinds arrive as empty and dispatch as a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<HeartbeatMessage>,
}

impl Envelope {
    /// Envelope carrying a single registration payload
    pub fn registration(msg: RegistrationMessage) -> Self {
        Self {
            registration: Some(msg),
            ..Default::default()
        }
    }

    /// Envelope carrying a single heartbeat payload
    pub fn heartbeat(msg: HeartbeatMessage) -> Self {
        Self {
            heartbeat: Some(msg),
            ..Default::default()
        }
    }

    /// The payload kinds present, in dispatch order
    pub fn kinds(&self) -> Vec<PayloadKind> {
        PayloadKind::DISPATCH_ORDER
            .into_iter()
            .filter(|kind| match kind {
                PayloadKind::Registration => self.registration.is_some(),
                PayloadKind::Heartbeat => self.heartbeat.is_some(),
            })
            .collect()
    }

    /// True when no recognized payload kind is present
    pub fn is_empty(&self) -> bool {
        self.registration.is_none() && self.heartbeat.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registration_msg() -> RegistrationMessage {
        RegistrationMessage {
            resource_id: "5b3b0a6e-8a3b-4f59-9d1c-0a1b2c3d4e5f".to_string(),
            descriptor: ResourceDescriptor::new(json!({"cpus": 4})),
        }
    }

    #[test]
    fn test_kinds_are_in_dispatch_order() {
        let envelope = Envelope {
            registration: Some(registration_msg()),
            heartbeat: Some(HeartbeatMessage {
                resource_id: "5b3b0a6e-8a3b-4f59-9d1c-0a1b2c3d4e5f".to_string(),
            }),
        };
        assert_eq!(envelope.kinds(), vec![PayloadKind::Registration, PayloadKind::Heartbeat]);
    }

    #[test]
    fn test_empty_envelope_has_no_kinds() {
        let envelope = Envelope::default();
        assert!(envelope.is_empty());
        assert!(envelope.kinds().is_empty());
    }

    #[test]
    fn test_single_kind_constructors() {
        let envelope = Envelope::heartbeat(HeartbeatMessage {
            resource_id: "x".to_string(),
        });
        assert_eq!(envelope.kinds(), vec![PayloadKind::Heartbeat]);
        assert!(envelope.registration.is_none());
    }

    #[test]
    fn test_envelope_serde_roundtrip() {
        let envelope = Envelope::registration(registration_msg());
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("resource-id"));
        assert!(json.contains("resource-descriptor"));
        // absent kinds are not serialized
        assert!(!json.contains("heartbeat"));

        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_unknown_payload_kinds_are_tolerated() {
        let json = r#"{"topology-report": {"sockets": 2}}"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(envelope.is_empty());
    }

    #[test]
    fn test_descriptor_defaults_when_missing() {
        let json = r#"{"registration": {"resource-id": "abc"}}"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        let msg = envelope.registration.unwrap();
        assert_eq!(msg.descriptor, ResourceDescriptor::default());
    }
}
