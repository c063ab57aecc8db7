//! Coordinator task: registry ownership and the dispatch loop

use eyre::{Result, WrapErr};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::config::CoordinatorConfig;
use super::handle::CoordinatorHandle;
use super::messages::{CoordRequest, CoordinatorMetrics};
use super::registry::{HeartbeatOutcome, RegisterOutcome, ResourceRegistry};
use super::shutdown::ShutdownToken;
use crate::domain::{self, JobDescriptor, ResourceDescriptor, ResourceId};
use crate::messages::{Envelope, HeartbeatMessage, PayloadKind, RegistrationMessage};
use crate::transport::{self, Transport};

/// Final accounting returned by [`Coordinator::run`]
#[derive(Debug)]
pub struct CoordinatorReport {
    /// Why the loop exited
    pub reason: String,
    pub metrics: CoordinatorMetrics,
}

/// The coordinator owns the resource registry and drives dispatch
///
/// Single-writer discipline: the registry is touched only from [`run`],
/// which drains one bounded queue. Transports and handles hold a sender
/// into that queue and nothing else, so no registry locking exists
/// anywhere.
pub struct Coordinator {
    config: CoordinatorConfig,
    identity: ResourceId,
    descriptor: ResourceDescriptor,
    registry: ResourceRegistry,
    metrics: CoordinatorMetrics,
    tx: mpsc::Sender<CoordRequest>,
    rx: mpsc::Receiver<CoordRequest>,
    shutdown: ShutdownToken,
    transport: Box<dyn Transport>,
}

impl Coordinator {
    /// Create a coordinator with the transport selected by the config
    ///
    /// Fails if the configured platform or listen uri is unsupported; the
    /// process must not come up without a working transport.
    pub fn new(config: CoordinatorConfig) -> Result<Self> {
        let transport = transport::for_platform(&config.platform, &config.listen_uri)
            .wrap_err("no usable transport for this configuration")?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a coordinator with an explicit transport (tests, embedding)
    pub fn with_transport(config: CoordinatorConfig, transport: Box<dyn Transport>) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_buffer);
        let identity = ResourceId::generate();
        let descriptor = ResourceDescriptor::for_coordinator(identity);

        info!(
            uri = %config.listen_uri,
            platform = %config.platform,
            identity = %identity,
            "coordinator starting"
        );

        Self {
            config,
            identity,
            descriptor,
            registry: ResourceRegistry::new(),
            metrics: CoordinatorMetrics::default(),
            tx,
            rx,
            shutdown: ShutdownToken::new(),
            transport,
        }
    }

    /// This coordinator's own identity
    pub fn identity(&self) -> ResourceId {
        self.identity
    }

    /// Descriptor the coordinator publishes for itself
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Sender feeding the request queue (for wiring additional producers)
    pub fn sender(&self) -> mpsc::Sender<CoordRequest> {
        self.tx.clone()
    }

    /// Control handle for this coordinator
    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle::new(self.tx.clone(), self.shutdown.clone())
    }

    /// Token that stops the event loop when triggered
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Run until the shutdown token trips
    ///
    /// Binds the transport, then alternates between awaiting the next
    /// request (bounded by the configured timeout) and dispatching it. The
    /// token is checked at loop-top only: an in-flight wait always
    /// finishes first, so shutdown lands within one wait-cycle. On the way
    /// out the transport stops listening exactly once and the recorded
    /// reason goes into the report.
    pub async fn run(mut self) -> Result<CoordinatorReport> {
        self.transport
            .listen(&self.config.listen_uri, self.tx.clone())
            .await
            .wrap_err_with(|| format!("failed to listen on {}", self.config.listen_uri))?;
        info!(uri = %self.config.listen_uri, "coordinator listening");

        let await_timeout = self.config.await_timeout();
        while !self.shutdown.is_triggered() {
            match timeout(await_timeout, self.rx.recv()).await {
                Ok(Some(request)) => self.handle_request(request),
                Ok(None) => self.shutdown.trigger("request queue closed"),
                // wait bound elapsed; go back around and re-check the token
                Err(_) => {}
            }
        }

        let reason = self
            .shutdown
            .reason()
            .unwrap_or_else(|| "dropped out of main loop".to_string());
        info!(%reason, "coordinator shutting down");
        self.transport.stop_listen().await;
        self.metrics.known_resources = self.registry.len();
        info!("coordinator stopped");

        Ok(CoordinatorReport {
            reason,
            metrics: self.metrics,
        })
    }

    fn handle_request(&mut self, request: CoordRequest) {
        match request {
            CoordRequest::Delivery(Ok(envelope)) => self.dispatch(envelope),
            CoordRequest::Delivery(Err(error)) => {
                self.metrics.receive_errors += 1;
                warn!(%error, "receive failed, dropping message");
            }
            CoordRequest::SubmitJob { descriptor, reply } => {
                let job_id = self.submit_job(&descriptor);
                let _ = reply.send(job_id);
            }
            CoordRequest::GetResource { id, reply } => {
                let _ = reply.send(self.registry.lookup(&id).cloned());
            }
            CoordRequest::GetMetrics { reply } => {
                let mut snapshot = self.metrics.clone();
                snapshot.known_resources = self.registry.len();
                let _ = reply.send(snapshot);
            }
        }
    }

    /// Invoke the handler for every recognized payload kind present
    ///
    /// Kinds coexist in one envelope; registration is applied before
    /// heartbeat so a coexisting heartbeat lands on the fresh record. An
    /// envelope carrying no recognized kind is a no-op, not an error.
    fn dispatch(&mut self, envelope: Envelope) {
        let kinds = envelope.kinds();
        if kinds.is_empty() {
            self.metrics.empty_envelopes += 1;
            debug!("envelope carried no recognized payload");
            return;
        }

        let now = domain::now_us();
        for kind in kinds {
            match kind {
                PayloadKind::Registration => {
                    if let Some(msg) = envelope.registration.as_ref() {
                        self.handle_registration(msg, now);
                    }
                }
                PayloadKind::Heartbeat => {
                    if let Some(msg) = envelope.heartbeat.as_ref() {
                        self.handle_heartbeat(msg, now);
                    }
                }
            }
        }
        self.metrics.envelopes_dispatched += 1;
    }

    fn handle_registration(&mut self, msg: &RegistrationMessage, now: u64) {
        let id = match msg.resource_id.parse::<ResourceId>() {
            Ok(id) => id,
            Err(error) => {
                warn!(raw = %msg.resource_id, %error, "registration carried a malformed resource id");
                return;
            }
        };

        match self.registry.register(id, msg.descriptor.clone(), now) {
            RegisterOutcome::New => {
                self.metrics.registrations_new += 1;
                info!(resource = %id, "registered new resource");
            }
            RegisterOutcome::KnownResource => {
                self.metrics.registrations_known += 1;
                // Possibly a recovering resource; until recovery handling
                // lands, this acts as an implicit heartbeat only.
                info!(resource = %id, "registration from known resource, refreshed last-seen");
            }
        }
    }

    fn handle_heartbeat(&mut self, msg: &HeartbeatMessage, now: u64) {
        let id = match msg.resource_id.parse::<ResourceId>() {
            Ok(id) => id,
            Err(error) => {
                warn!(raw = %msg.resource_id, %error, "heartbeat carried a malformed resource id");
                return;
            }
        };

        match self.registry.heartbeat(&id, now) {
            HeartbeatOutcome::Refreshed { previous_last_seen } => {
                self.metrics.heartbeats_refreshed += 1;
                debug!(resource = %id, previous_last_seen, "heartbeat");
            }
            HeartbeatOutcome::Unknown => {
                self.metrics.heartbeats_unknown += 1;
                warn!(resource = %id, "heartbeat from unknown resource");
            }
        }
    }

    /// Accept a job and assign it an opaque id
    ///
    /// Placement belongs to the external scheduler; the coordinator only
    /// logs receipt.
    fn submit_job(&mut self, descriptor: &JobDescriptor) -> String {
        let job_id = domain::generate_job_id(&descriptor.name);
        self.metrics.jobs_submitted += 1;
        info!(job = %job_id, name = %descriptor.name, "new job submitted");
        job_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ChannelTransport, TransportError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn test_config() -> CoordinatorConfig {
        CoordinatorConfig {
            await_timeout_ms: 20,
            ..Default::default()
        }
    }

    fn test_coordinator() -> Coordinator {
        Coordinator::with_transport(test_config(), Box::new(ChannelTransport::new()))
    }

    fn registration(id: ResourceId, descriptor: serde_json::Value) -> RegistrationMessage {
        RegistrationMessage {
            resource_id: id.to_string(),
            descriptor: ResourceDescriptor::new(descriptor),
        }
    }

    struct CountingTransport {
        stops: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn listen(&mut self, _uri: &str, _deliveries: mpsc::Sender<CoordRequest>) -> Result<(), TransportError> {
            Ok(())
        }

        async fn stop_listen(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_dispatch_registration_then_heartbeat_in_one_envelope() {
        let mut coordinator = test_coordinator();
        let id = ResourceId::generate();

        coordinator.dispatch(Envelope {
            registration: Some(registration(id, json!({"cpus": 4}))),
            heartbeat: Some(HeartbeatMessage {
                resource_id: id.to_string(),
            }),
        });

        // registration created the record, the coexisting heartbeat
        // refreshed it; each applied exactly once
        assert_eq!(coordinator.metrics.registrations_new, 1);
        assert_eq!(coordinator.metrics.heartbeats_refreshed, 1);
        assert_eq!(coordinator.metrics.heartbeats_unknown, 0);
        assert_eq!(coordinator.metrics.envelopes_dispatched, 1);
        assert!(coordinator.registry.lookup(&id).is_some());
    }

    #[tokio::test]
    async fn test_dispatch_empty_envelope_is_a_noop() {
        let mut coordinator = test_coordinator();

        coordinator.dispatch(Envelope::default());

        assert_eq!(coordinator.metrics.empty_envelopes, 1);
        assert_eq!(coordinator.metrics.envelopes_dispatched, 0);
        assert!(coordinator.registry.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_resource_id_is_dropped() {
        let mut coordinator = test_coordinator();

        coordinator.dispatch(Envelope::registration(RegistrationMessage {
            resource_id: "not-a-uuid".to_string(),
            descriptor: ResourceDescriptor::default(),
        }));

        assert!(coordinator.registry.is_empty());
        assert_eq!(coordinator.metrics.registrations_new, 0);
    }

    #[tokio::test]
    async fn test_receive_error_is_counted_and_dropped() {
        let mut coordinator = test_coordinator();

        coordinator.handle_request(CoordRequest::Delivery(Err(TransportError::Receive(
            "connection reset".to_string(),
        ))));

        assert_eq!(coordinator.metrics.receive_errors, 1);
        assert!(coordinator.registry.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_descriptor() {
        let mut coordinator = test_coordinator();
        let id = ResourceId::generate();

        coordinator.dispatch(Envelope::registration(registration(id, json!({"cpus": 4}))));
        coordinator.dispatch(Envelope::registration(registration(id, json!({"cpus": 8}))));

        assert_eq!(coordinator.metrics.registrations_new, 1);
        assert_eq!(coordinator.metrics.registrations_known, 1);
        let record = coordinator.registry.lookup(&id).unwrap();
        assert_eq!(record.descriptor, ResourceDescriptor::new(json!({"cpus": 4})));
    }

    #[tokio::test]
    async fn test_submit_job_returns_opaque_id() {
        let mut coordinator = test_coordinator();
        let job_id = coordinator.submit_job(&JobDescriptor::new("Index Rebuild", json!({})));

        assert!(job_id.contains("-job-index-rebuild"));
        assert_eq!(coordinator.metrics.jobs_submitted, 1);
    }

    #[tokio::test]
    async fn test_coordinator_publishes_its_own_identity() {
        let coordinator = test_coordinator();
        let identity = coordinator.identity();
        assert_eq!(coordinator.descriptor().as_value()["uuid"], identity.to_string());
    }

    #[tokio::test]
    async fn test_new_rejects_unsupported_platform() {
        let config = CoordinatorConfig {
            platform: "infiniband".to_string(),
            ..Default::default()
        };
        assert!(Coordinator::new(config).is_err());
    }

    #[tokio::test]
    async fn test_run_fails_fatally_when_bind_fails() {
        let config = CoordinatorConfig {
            listen_uri: "tcp://definitely-not-a-host.invalid:1".to_string(),
            ..test_config()
        };
        let coordinator = Coordinator::new(config).unwrap();
        assert!(coordinator.run().await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_exits_within_one_wait_cycle_and_stops_listening_once() {
        let stops = Arc::new(AtomicUsize::new(0));
        let coordinator = Coordinator::with_transport(
            test_config(),
            Box::new(CountingTransport { stops: stops.clone() }),
        );
        let handle = coordinator.handle();
        let task = tokio::spawn(coordinator.run());

        handle.shutdown("test shutdown");

        let report = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("loop did not exit within one wait-cycle")
            .unwrap()
            .unwrap();

        assert_eq!(report.reason, "test shutdown");
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loop_continues_after_receive_error() {
        let transport = ChannelTransport::new();
        let client = transport.client();
        let coordinator = Coordinator::with_transport(test_config(), Box::new(transport));
        let handle = coordinator.handle();
        let task = tokio::spawn(coordinator.run());

        client
            .fail(TransportError::Receive("connection reset".to_string()))
            .await
            .unwrap();

        let id = ResourceId::generate();
        client
            .deliver(Envelope::registration(registration(id, json!({"cpus": 2}))))
            .await
            .unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let metrics = handle.metrics().await.unwrap();
            if metrics.registrations_new == 1 && metrics.receive_errors == 1 {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "metrics never converged");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        handle.shutdown("test finished");
        let report = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap().unwrap();
        assert_eq!(report.metrics.known_resources, 1);
    }
}
