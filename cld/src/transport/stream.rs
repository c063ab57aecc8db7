//! TCP stream transport
//!
//! Wire format: one JSON-encoded [`Envelope`] per line. Each accepted
//! connection gets its own reader task; lines decode in read order and are
//! forwarded into the coordinator's request queue, so ordering holds within
//! a connection but not across connections.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Transport, TransportError};
use crate::coordinator::CoordRequest;
use crate::messages::Envelope;

/// Transport listening for line-delimited JSON envelopes over TCP
pub struct TcpTransport {
    local_addr: Option<SocketAddr>,
    accept_task: Option<JoinHandle<()>>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            local_addr: None,
            accept_task: None,
        }
    }

    /// Address actually bound, available once listening (port 0 resolves
    /// to a real port here)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the `tcp://` scheme
fn host_port(uri: &str) -> Result<&str, TransportError> {
    uri.strip_prefix("tcp://")
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| TransportError::InvalidUri(uri.to_string()))
}

#[async_trait]
impl Transport for TcpTransport {
    async fn listen(&mut self, uri: &str, deliveries: mpsc::Sender<CoordRequest>) -> Result<(), TransportError> {
        if self.accept_task.is_some() {
            return Err(TransportError::AlreadyListening);
        }

        let addr = host_port(uri)?;
        let listener = TcpListener::bind(addr).await.map_err(|source| TransportError::Bind {
            uri: uri.to_string(),
            source,
        })?;
        self.local_addr = listener.local_addr().ok();
        info!(uri, "transport listening");

        self.accept_task = Some(tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        debug!(%peer, "resource connected");
                        tokio::spawn(read_connection(stream, peer, deliveries.clone()));
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                    }
                }
            }
        }));

        Ok(())
    }

    async fn stop_listen(&mut self) {
        // Aborting the accept task drops the listener and closes the
        // socket. Per-connection readers drain on their own once the
        // request queue or their peer goes away.
        if let Some(task) = self.accept_task.take() {
            task.abort();
            debug!("transport stopped listening");
        }
    }
}

/// Read line-delimited envelopes from one connection until it closes
async fn read_connection(stream: TcpStream, peer: SocketAddr, deliveries: mpsc::Sender<CoordRequest>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!(%peer, "resource disconnected");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let delivery =
                    serde_json::from_str::<Envelope>(trimmed).map_err(|e| TransportError::Decode(e.to_string()));
                if deliveries.send(CoordRequest::Delivery(delivery)).await.is_err() {
                    debug!(%peer, "request queue closed, dropping connection");
                    break;
                }
            }
            Err(e) => {
                let _ = deliveries
                    .send(CoordRequest::Delivery(Err(TransportError::Receive(e.to_string()))))
                    .await;
                break;
            }
        }
    }
}
