//! Resource identity and registration records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique 128-bit identity of a compute resource (or the coordinator itself)
///
/// Generated once, immutable afterwards. Serializes as its canonical string
/// form, which is also what travels inside control messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Generate a fresh random identity
    ///
    /// Random v4 uuids need no cross-instance coordination; collisions are
    /// birthday-bound negligible.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying uuid
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ResourceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for ResourceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Opaque capability metadata describing a resource
///
/// The coordinator never interprets the contents; it copies the blob into
/// the registry on first registration and hands copies back out on lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceDescriptor(serde_json::Value);

impl ResourceDescriptor {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The descriptor the coordinator publishes for itself, carrying its
    /// own identity in string form
    pub fn for_coordinator(id: ResourceId) -> Self {
        Self(serde_json::json!({ "uuid": id.to_string() }))
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Registry entry pairing a resource's descriptor with its last-seen time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Capability metadata from the first registration
    pub descriptor: ResourceDescriptor,

    /// Last observed liveness, microseconds since the Unix epoch
    #[serde(rename = "last-seen-us")]
    pub last_seen_us: u64,
}

/// Microseconds since the Unix epoch
pub fn now_us() -> u64 {
    chrono::Utc::now().timestamp_micros().max(0) as u64
}
