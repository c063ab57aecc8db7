//! clusterd - control-plane coordinator for cluster resources
//!
//! The coordinator accepts connections from compute resources, tracks which
//! resources exist and are alive, and dispatches inbound control messages
//! to the right handler. Placement of submitted jobs is left to an external
//! scheduler behind the submission boundary.
//!
//! # Core Concepts
//!
//! - **Single-writer registry**: one task owns all liveness state; every
//!   mutation arrives through one bounded queue
//! - **Optional-and-coexisting payloads**: an envelope may carry any subset
//!   of the recognized message kinds; registration dispatches before
//!   heartbeat
//! - **Cooperative shutdown**: a per-instance token observed at loop-top,
//!   never preempting an in-flight wait
//!
//! # Modules
//!
//! - [`coordinator`] - registry, dispatch loop, lifecycle
//! - [`transport`] - transport adapters (TCP, in-process)
//! - [`messages`] - the wire-facing envelope and payloads
//! - [`domain`] - resource identity, records, job descriptors
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod messages;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{
    CoordRequest, Coordinator, CoordinatorConfig, CoordinatorHandle, CoordinatorMetrics, CoordinatorReport,
    HeartbeatOutcome, RegisterOutcome, ResourceRegistry, ShutdownToken,
};
pub use domain::{JobDescriptor, RegistrationRecord, ResourceDescriptor, ResourceId};
pub use messages::{Envelope, HeartbeatMessage, PayloadKind, RegistrationMessage};
pub use transport::{ChannelTransport, Delivery, TcpTransport, Transport, TransportClient, TransportError};
