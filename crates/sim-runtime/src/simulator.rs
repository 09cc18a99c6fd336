//! # Simulator
//!
//! Owns the world, the inboxes and the worker tasks of one run.
//!
//! ## Lifecycle
//!
//! 1. `build`: validate config and topology, create channels, the route
//!    table, one inbox and one handler per node. Nothing runs yet.
//! 2. `start`: spawn one task per node and publish `SimulationStarted`.
//! 3. Commands: `send_message`, `start_qkd`, `retry_qkd` enqueue work on a
//!    node's inbox; `keys` reads completed keys.
//! 4. `stop`: flip the stop signal, join every worker, publish
//!    `SimulationStopped`.

use std::collections::HashMap;
use std::sync::Arc;

use qn_01_topology::TopologyDescription;
use serde_json::json;
use shared_bus::{EventPublisher, EventType, InMemoryEventBus, SimulationEvent};
use shared_types::entities::{NodeId, NodeKind};
use shared_types::errors::SimulationError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, Instrument};

use crate::adapters::{node_rng, NodeEvents};
use crate::container::{SimulationConfig, World};
use crate::errors::RuntimeError;
use crate::handlers::{NodeContext, NodeHandler, NodeWorker};
use crate::keys::{KeyStore, SharedKey};
use crate::wiring::{Mailboxes, NodeCommand};

/// Source id of lifecycle events.
pub const SIMULATOR_ID: &str = "simulator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Built,
    Running,
    Stopped,
}

pub struct Simulator {
    config: Arc<SimulationConfig>,
    world: Arc<World>,
    bus: Arc<InMemoryEventBus>,
    mailboxes: Arc<Mailboxes>,
    keys: KeyStore,
    pending: Vec<NodeWorker>,
    handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    state: RunState,
}

impl Simulator {
    /// Validate `description` and `config` and prepare one worker per node.
    pub fn build(
        description: &TopologyDescription,
        config: SimulationConfig,
        bus: Arc<InMemoryEventBus>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;
        let world = Arc::new(World::build(description).map_err(SimulationError::from)?);
        for channel in world.quantum_channels() {
            config.check_round(&channel.name, channel.num_bits)?;
        }
        let config = Arc::new(config);

        let node_ids: Vec<NodeId> = world.topology().nodes().map(|n| n.id.clone()).collect();
        let (mailboxes, mut inboxes) = Mailboxes::open(node_ids, config.inbox_capacity);
        let mailboxes = Arc::new(mailboxes);
        let keys = KeyStore::new();
        let publisher: Arc<dyn EventPublisher> = bus.clone();

        let mut pending = Vec::new();
        for node in world.topology().nodes() {
            let Some(inbox) = inboxes.remove(&node.id) else {
                continue;
            };
            let ctx = NodeContext {
                node: node.id.clone(),
                world: Arc::clone(&world),
                mailboxes: Arc::clone(&mailboxes),
                events: NodeEvents::new(node.id.clone(), node.kind, Arc::clone(&publisher)),
                rng: node_rng(config.seed, &node.id),
                keys: keys.clone(),
                config: Arc::clone(&config),
            };
            pending.push(NodeWorker::new(NodeHandler::for_node(node, &world), ctx, inbox));
        }

        info!(
            topology = world.topology().name(),
            workers = pending.len(),
            seed = ?config.seed,
            "Simulator built"
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            world,
            bus,
            mailboxes,
            keys,
            pending,
            handles: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            state: RunState::Built,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Spawn every worker. Must be called inside a tokio runtime.
    pub async fn start(&mut self) -> Result<(), RuntimeError> {
        if self.state != RunState::Built {
            return Err(RuntimeError::AlreadyStarted);
        }
        let tick = self.config.tick_interval;
        let workers = self.pending.len();
        for worker in self.pending.drain(..) {
            let shutdown = self.shutdown_rx.clone();
            let span = quantum_telemetry::node_span!("node_worker", node = %worker.node());
            self.handles
                .push(tokio::spawn(worker.run(shutdown, tick).instrument(span)));
        }
        self.state = RunState::Running;

        info!(workers, tick_ms = tick.as_millis() as u64, "Simulation started");
        self.lifecycle(
            EventType::SimulationStarted,
            json!({ "topology": self.world.topology().name(), "workers": workers }),
        )
        .await;
        Ok(())
    }

    /// Signal every worker and wait for all of them to exit.
    pub async fn stop(&mut self) -> Result<(), RuntimeError> {
        if self.state != RunState::Running {
            return Err(RuntimeError::NotRunning);
        }
        // The simulator holds a receiver, so the send cannot fail.
        let _ = self.shutdown_tx.send(true);

        let workers = self.handles.len();
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task failed");
            }
        }
        self.state = RunState::Stopped;

        info!(workers, "Simulation stopped");
        self.lifecycle(EventType::SimulationStopped, json!({ "workers": workers }))
            .await;
        Ok(())
    }

    async fn lifecycle(&self, event_type: EventType, payload: serde_json::Value) {
        let event = SimulationEvent::new(event_type, NodeId::from(SIMULATOR_ID), payload);
        self.bus.publish(event).await;
    }

    fn resolve(&self, name: &str) -> Result<NodeId, SimulationError> {
        self.world
            .resolve(name)
            .filter(|id| self.mailboxes.contains(id))
            .ok_or_else(|| SimulationError::NodeNotFound(name.to_string()))
    }

    fn resolve_quantum_host(&self, name: &str) -> Result<NodeId, SimulationError> {
        let host = self.resolve(name)?;
        match self.world.kind_of(&host) {
            Some(NodeKind::QuantumHost) => Ok(host),
            _ => Err(SimulationError::ProtocolViolation {
                node: host,
                reason: "key agreement runs on quantum hosts only".to_string(),
            }),
        }
    }

    /// Have `from` originate a data packet for `to`.
    pub fn send_message(
        &self,
        from: &str,
        to: &str,
        payload: impl Into<String>,
    ) -> Result<(), SimulationError> {
        let source = self.resolve(from)?;
        let destination = self.resolve(to)?;
        if !self.world.kind_of(&source).is_some_and(NodeKind::is_classical) {
            return Err(SimulationError::ProtocolViolation {
                node: source,
                reason: "only classical nodes originate data packets".to_string(),
            });
        }
        self.mailboxes.command(
            &source,
            NodeCommand::SendData {
                to: destination,
                payload: payload.into(),
            },
        )
    }

    /// Begin key agreement on `host`.
    ///
    /// Fails with `ChannelNotFound` when the host has no quantum channel.
    pub async fn start_qkd(&self, host: &str) -> Result<(), SimulationError> {
        let host = self.resolve_quantum_host(host)?;
        if self.world.quantum_channels_of(&host).is_empty() {
            return Err(SimulationError::ChannelNotFound(host));
        }
        self.mailboxes.command(&host, NodeCommand::StartQkd)?;
        self.publish_initiated(&host, "command").await;
        Ok(())
    }

    /// Re-run the last round `host` initiated.
    pub async fn retry_qkd(&self, host: &str) -> Result<(), SimulationError> {
        let host = self.resolve_quantum_host(host)?;
        self.mailboxes.command(&host, NodeCommand::RetryQkd)?;
        self.publish_initiated(&host, "retry").await;
        Ok(())
    }

    async fn publish_initiated(&self, host: &NodeId, trigger: &str) {
        let event = SimulationEvent::new(
            EventType::QkdInitiated,
            host.clone(),
            json!({ "quantum_host": host, "trigger": trigger }),
        );
        self.bus.publish(event).await;
    }

    /// Latest completed key per host.
    pub fn keys(&self) -> HashMap<NodeId, SharedKey> {
        self.keys.snapshot()
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        // Workers must not outlive the simulator that owns their inboxes.
        let _ = self.shutdown_tx.send(true);
    }
}
