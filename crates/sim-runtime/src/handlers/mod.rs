//! # Node Handlers
//!
//! One worker per node. The worker owns its handler and context outright;
//! nothing it mutates is visible to another worker except through inboxes
//! and the key store.
//!
//! ```text
//!            ┌──────────── tick ────────────┐
//!            ▼                              │
//!  inbox ─► drain to empty ─► handler ──────┘
//!                               │ Err
//!                               ▼
//!                        NodeEvents::report
//! ```
//!
//! The stop signal is checked between items, so a worker exits within one
//! tick and never abandons an item halfway through.

pub mod classical;
pub mod quantum_host;
pub mod repeater;

use std::sync::Arc;
use std::time::Duration;

use qn_01_topology::Node;
use rand::rngs::StdRng;
use shared_types::entities::{NodeId, NodeKind};
use shared_types::errors::SimulationError;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub use classical::ClassicalHandler;
pub use quantum_host::QuantumHostHandler;
pub use repeater::RepeaterHandler;

use crate::adapters::NodeEvents;
use crate::container::{SimulationConfig, World};
use crate::keys::KeyStore;
use crate::wiring::{Inbox, Mailboxes, WorkerInput};

/// What a handler may touch besides its own state.
pub struct NodeContext {
    pub node: NodeId,
    pub world: Arc<World>,
    pub mailboxes: Arc<Mailboxes>,
    pub events: NodeEvents,
    pub rng: StdRng,
    pub keys: KeyStore,
    pub config: Arc<SimulationConfig>,
}

/// Closed dispatch over node behaviours.
pub enum NodeHandler {
    Classical(ClassicalHandler),
    QuantumHost(QuantumHostHandler),
    Repeater(RepeaterHandler),
}

impl NodeHandler {
    pub fn for_node(node: &Node, world: &World) -> Self {
        match node.kind {
            NodeKind::ClassicalHost
            | NodeKind::ClassicalRouter
            | NodeKind::InternetExchange
            | NodeKind::Adapter => Self::Classical(ClassicalHandler::new(&node.id, node.kind, world)),
            NodeKind::QuantumHost => {
                Self::QuantumHost(QuantumHostHandler::new(&node.id, node.protocol, world))
            }
            NodeKind::QuantumRepeater => {
                Self::Repeater(RepeaterHandler::new(&node.id, node.num_memories, world))
            }
        }
    }

    pub async fn handle(
        &mut self,
        ctx: &mut NodeContext,
        input: WorkerInput,
    ) -> Result<(), SimulationError> {
        match self {
            Self::Classical(handler) => handler.handle(ctx, input).await,
            Self::QuantumHost(handler) => handler.handle(ctx, input).await,
            Self::Repeater(handler) => handler.handle(ctx, input).await,
        }
    }
}

/// A node's handler, context and inbox, ready to be spawned.
pub struct NodeWorker {
    handler: NodeHandler,
    ctx: NodeContext,
    inbox: Inbox,
}

impl NodeWorker {
    pub fn new(handler: NodeHandler, ctx: NodeContext, inbox: Inbox) -> Self {
        Self {
            handler,
            ctx,
            inbox,
        }
    }

    pub fn node(&self) -> &NodeId {
        &self.ctx.node
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>, tick: Duration) {
        let stop = shutdown.clone();
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(node = %self.ctx.node, "[node] Worker started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if self.drain(&stop).await {
                        break;
                    }
                }
            }
        }
        info!(node = %self.ctx.node, "[node] Shutdown signal received");
    }

    /// Process everything queued. Returns whether a stop was observed.
    async fn drain(&mut self, stop: &watch::Receiver<bool>) -> bool {
        while let Ok(input) = self.inbox.try_recv() {
            if let Err(err) = self.handler.handle(&mut self.ctx, input).await {
                self.ctx.events.report(&err).await;
            }
            if *stop.borrow() {
                return true;
            }
        }
        *stop.borrow()
    }
}
