//! Resource registry, the single source of truth for liveness
//!
//! Owned exclusively by the coordinator task; every mutation arrives
//! through the coordinator's request queue, so no locking happens here.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::domain::{RegistrationRecord, ResourceDescriptor, ResourceId};

/// Outcome of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// First time this identity has been seen; a record was created.
    New,

    /// The identity is already tracked. This can mean the resource came
    /// back after a crash; telling recovery apart from a plain duplicate
    /// is not implemented yet, so callers get this classified outcome and
    /// the record only receives a fresh last-seen timestamp. The stored
    /// descriptor stays whatever the first registration carried.
    KnownResource,
}

/// Outcome of a heartbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// Timestamp refreshed; carries the previous last-seen value.
    Refreshed { previous_last_seen: u64 },

    /// No record exists for this identity; nothing was mutated.
    Unknown,
}

/// Mapping from resource identity to registration record
///
/// At most one record per identity; records are never deleted (staleness
/// eviction is an unimplemented extension point).
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: HashMap<ResourceId, RegistrationRecord>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for an identity
    pub fn lookup(&self, id: &ResourceId) -> Option<&RegistrationRecord> {
        self.resources.get(id)
    }

    /// Register a resource, or refresh it if already known
    ///
    /// A registration from a known identity acts as an implicit heartbeat:
    /// only the timestamp moves, never the stored descriptor.
    pub fn register(&mut self, id: ResourceId, descriptor: ResourceDescriptor, now: u64) -> RegisterOutcome {
        match self.resources.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(RegistrationRecord {
                    descriptor,
                    last_seen_us: now,
                });
                RegisterOutcome::New
            }
            Entry::Occupied(mut entry) => {
                entry.get_mut().last_seen_us = now;
                RegisterOutcome::KnownResource
            }
        }
    }

    /// Refresh the last-seen timestamp for a known resource
    pub fn heartbeat(&mut self, id: &ResourceId, now: u64) -> HeartbeatOutcome {
        match self.resources.get_mut(id) {
            Some(record) => {
                let previous_last_seen = record.last_seen_us;
                record.last_seen_us = now;
                HeartbeatOutcome::Refreshed { previous_last_seen }
            }
            None => HeartbeatOutcome::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate over all records
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &RegistrationRecord)> {
        self.resources.iter()
    }
}
