//! In-process transport for tests and embedding
//!
//! Messages injected through a [`TransportClient`] are forwarded into the
//! coordinator's request queue by a single forwarder task, preserving
//! injection order.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Delivery, Transport, TransportError};
use crate::coordinator::CoordRequest;
use crate::messages::Envelope;

/// Transport whose "wire" is an in-process channel
pub struct ChannelTransport {
    tx: mpsc::Sender<Delivery>,
    rx: Option<mpsc::Receiver<Delivery>>,
    forwarder: Option<JoinHandle<()>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::with_buffer(256)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer);
        Self {
            tx,
            rx: Some(rx),
            forwarder: None,
        }
    }

    /// Handle for injecting messages, as a connected resource would
    pub fn client(&self) -> TransportClient {
        TransportClient { tx: self.tx.clone() }
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn listen(&mut self, _uri: &str, deliveries: mpsc::Sender<CoordRequest>) -> Result<(), TransportError> {
        let mut rx = self.rx.take().ok_or(TransportError::AlreadyListening)?;
        self.forwarder = Some(tokio::spawn(async move {
            while let Some(delivery) = rx.recv().await {
                if deliveries.send(CoordRequest::Delivery(delivery)).await.is_err() {
                    debug!("request queue closed, forwarder exiting");
                    break;
                }
            }
        }));
        Ok(())
    }

    async fn stop_listen(&mut self) {
        if let Some(handle) = self.forwarder.take() {
            handle.abort();
            debug!("channel transport stopped");
        }
    }
}

/// Client side of a [`ChannelTransport`]
#[derive(Clone)]
pub struct TransportClient {
    tx: mpsc::Sender<Delivery>,
}

impl TransportClient {
    /// Inject a decoded envelope; ownership moves to the coordinator
    pub async fn deliver(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.tx.send(Ok(envelope)).await.map_err(|_| TransportError::Closed)
    }

    /// Inject a receive failure, as a broken connection would produce
    pub async fn fail(&self, error: TransportError) -> Result<(), TransportError> {
        self.tx.send(Err(error)).await.map_err(|_| TransportError::Closed)
    }
}
