//! # Event Bus Adapter
//!
//! Per-node handle on the shared event bus. Stamps every event with the
//! owning node and turns node-local errors into structured events.
//!
//! ## Error mapping
//!
//! | Error | Event | Level |
//! |-------|-------|-------|
//! | `DeliveryFailed`, `ChannelNotFound` | `TransmissionFailed` | error |
//! | anything else | `PacketDropped` | warning |

use std::sync::Arc;

use quantum_telemetry::{metric_inc, NODE_ERRORS};
use serde_json::{json, Value};
use shared_bus::{EventLevel, EventPublisher, EventType, SimulationEvent};
use shared_types::entities::{NodeId, NodeKind};
use shared_types::errors::SimulationError;
use tracing::warn;

#[derive(Clone)]
pub struct NodeEvents {
    node: NodeId,
    kind: NodeKind,
    bus: Arc<dyn EventPublisher>,
}

impl NodeEvents {
    pub fn new(node: NodeId, kind: NodeKind, bus: Arc<dyn EventPublisher>) -> Self {
        Self { node, kind, bus }
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    pub async fn emit(&self, event_type: EventType, payload: Value) {
        self.emit_at(EventLevel::Info, event_type, payload).await;
    }

    pub async fn emit_at(&self, level: EventLevel, event_type: EventType, payload: Value) {
        let event = SimulationEvent::new(event_type, self.node.clone(), payload).with_level(level);
        self.bus.publish(event).await;
    }

    /// `RepeaterEntanglementInfo` tagged with `info_type`.
    pub async fn info(&self, info_type: &str, mut payload: Value) {
        if let Value::Object(map) = &mut payload {
            map.insert("type".to_string(), Value::from(info_type));
        } else {
            payload = json!({ "type": info_type, "detail": payload });
        }
        self.emit(EventType::RepeaterEntanglementInfo, payload).await;
    }

    /// Log and publish an error caught at the worker boundary.
    pub async fn report(&self, err: &SimulationError) {
        let error_type = error_type(err);
        metric_inc!(NODE_ERRORS, &[self.kind.tag(), error_type]);
        warn!(node = %self.node, kind = %self.kind, error_type, error = %err, "[node] Error handled");

        let (event_type, level) = match err {
            SimulationError::DeliveryFailed { .. } | SimulationError::ChannelNotFound(_) => {
                (EventType::TransmissionFailed, EventLevel::Error)
            }
            _ => (EventType::PacketDropped, EventLevel::Warning),
        };
        self.emit_at(
            level,
            event_type,
            json!({ "error_type": error_type, "error": err.to_string() }),
        )
        .await;
    }
}

/// Stable label for an error variant.
pub fn error_type(err: &SimulationError) -> &'static str {
    match err {
        SimulationError::RouteNotFound { .. } => "route_not_found",
        SimulationError::ConnectionNotFound { .. } => "connection_not_found",
        SimulationError::ChannelNotFound(_) => "channel_not_found",
        SimulationError::ProtocolModeMismatch { .. } => "protocol_mode_mismatch",
        SimulationError::MemoryFull { .. } => "memory_full",
        SimulationError::StaleHandshake { .. } => "stale_handshake",
        SimulationError::ProtocolViolation { .. } => "protocol_violation",
        SimulationError::DeliveryFailed { .. } => "delivery_failed",
        SimulationError::InvalidQuantumState(_) => "invalid_quantum_state",
        SimulationError::NodeNotFound(_) => "node_not_found",
        SimulationError::MalformedTopology(_) => "malformed_topology",
    }
}
