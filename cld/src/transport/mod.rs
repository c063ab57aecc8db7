//! Transport adapters
//!
//! Sockets and framing live behind the [`Transport`] trait; the coordinator
//! never touches either directly. `listen` both binds and installs the
//! delivery sender: every decoded message is moved into the coordinator's
//! bounded request queue (as [`CoordRequest::Delivery`]) and never touched
//! by the transport again. Delivery order follows arrival order within a
//! connection; nothing is guaranteed across connections. Receive failures
//! travel the same queue as `Err` deliveries so the event loop can log and
//! drop them without special plumbing.

mod channel;
mod stream;

pub use channel::{ChannelTransport, TransportClient};
pub use stream::TcpTransport;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::coordinator::CoordRequest;
use crate::messages::Envelope;

/// One transport completion: a decoded envelope or a receive failure
pub type Delivery = Result<Envelope, TransportError>;

/// Transport failures
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("invalid listen uri: {0}")]
    InvalidUri(String),

    #[error("failed to bind {uri}")]
    Bind {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("already listening")]
    AlreadyListening,

    #[error("transport closed")]
    Closed,

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("failed to decode message: {0}")]
    Decode(String),
}

/// Contract between the coordinator and a message transport
#[async_trait]
pub trait Transport: Send {
    /// Bind to `uri` and start delivering decoded messages into `deliveries`.
    ///
    /// Fails on an unsupported or unparseable uri and on bind errors; the
    /// coordinator treats any failure here as fatal and refuses to start.
    async fn listen(&mut self, uri: &str, deliveries: mpsc::Sender<CoordRequest>) -> Result<(), TransportError>;

    /// Stop accepting and delivering. Idempotent.
    async fn stop_listen(&mut self);
}

/// Select a transport implementation for the configured platform
///
/// `auto` resolves from the listen uri scheme. An unrecognized platform or
/// scheme is a startup failure; the coordinator must not come up without a
/// working transport.
pub fn for_platform(platform: &str, listen_uri: &str) -> Result<Box<dyn Transport>, TransportError> {
    match platform {
        "tcp" => Ok(Box::new(TcpTransport::new())),
        "auto" => {
            if listen_uri.starts_with("tcp://") {
                Ok(Box::new(TcpTransport::new()))
            } else {
                Err(TransportError::InvalidUri(listen_uri.to_string()))
            }
        }
        other => Err(TransportError::UnsupportedPlatform(other.to_string())),
    }
}
