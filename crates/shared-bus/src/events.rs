//! # Simulation Events
//!
//! Defines the structured records that flow through the shared bus.
//! Every state transition of a simulated node is reported as one
//! [`SimulationEvent`]; external collaborators consume them as an
//! append-only stream.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use shared_types::entities::NodeId;

/// Kind of a simulation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // =========================================================================
    // TRANSMISSION
    // =========================================================================
    /// A node began sending something over a channel or connection.
    TransmissionStarted,
    /// A qubit or packet left the sender.
    PacketTransmitted,
    /// A qubit or packet reached a node's inbox.
    PacketReceived,
    /// A qubit or packet was lost (loss model, full memory, no route).
    PacketDropped,
    /// A qubit's state was altered by channel noise.
    PacketCorrupted,
    /// A transmission could not be carried out at all.
    TransmissionFailed,

    // =========================================================================
    // CLASSICAL DATA
    // =========================================================================
    /// A host originated a data packet.
    DataSent,
    /// A host consumed a data packet addressed to it.
    DataReceived,
    /// A router forwarded a packet to its next hop.
    PacketRouted,
    /// Route or connection lookup failed for a packet.
    RoutingError,
    /// A packet reached its destination.
    PacketDelivered,

    // =========================================================================
    // KEY DISTRIBUTION
    // =========================================================================
    /// A BB84 round was started.
    QkdInitiated,
    /// A BB84 round finished with a key.
    QkdCompleted,
    /// A BB84 round exceeded the error threshold.
    QkdFailed,

    // =========================================================================
    // ENTANGLEMENT
    // =========================================================================
    /// A host generated a Bell pair and sent one half out.
    RepeaterEntanglementInitialized,
    /// A correction was applied and a logical link exists.
    RepeaterEntangled,
    /// Informational repeater activity (buffering, forwarding, measurement).
    RepeaterEntanglementInfo,

    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    SimulationStarted,
    SimulationStopped,
}

impl EventType {
    /// Get the topic for this event type (for filtering).
    #[must_use]
    pub fn topic(self) -> EventTopic {
        match self {
            Self::TransmissionStarted
            | Self::PacketTransmitted
            | Self::PacketReceived
            | Self::PacketDropped
            | Self::PacketCorrupted
            | Self::TransmissionFailed => EventTopic::Transmission,
            Self::DataSent
            | Self::DataReceived
            | Self::PacketRouted
            | Self::RoutingError
            | Self::PacketDelivered => EventTopic::Routing,
            Self::QkdInitiated | Self::QkdCompleted | Self::QkdFailed => EventTopic::Qkd,
            Self::RepeaterEntanglementInitialized
            | Self::RepeaterEntangled
            | Self::RepeaterEntanglementInfo => EventTopic::Entanglement,
            Self::SimulationStarted | Self::SimulationStopped => EventTopic::Lifecycle,
        }
    }
}

/// Severity attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    #[default]
    Info,
    Warning,
    Error,
}

/// One record of the simulation event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Position in the stream, assigned by the bus on publish (from 1).
    #[serde(default)]
    pub sequence: u64,
    pub event_type: EventType,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub source_node: NodeId,
    pub level: EventLevel,
    pub payload: serde_json::Value,
}

impl SimulationEvent {
    /// Create an info-level event stamped with the current wall clock.
    pub fn new(event_type: EventType, source_node: NodeId, payload: serde_json::Value) -> Self {
        Self {
            sequence: 0,
            event_type,
            timestamp_ms: now_millis(),
            source_node,
            level: EventLevel::Info,
            payload,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn topic(&self) -> EventTopic {
        self.event_type.topic()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Physical-layer sends, receipts, losses.
    Transmission,
    /// Classical data and forwarding.
    Routing,
    /// BB84 rounds.
    Qkd,
    /// Bell pairs, repeaters and corrections.
    Entanglement,
    /// Simulation start/stop.
    Lifecycle,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Exact event types to include. Empty means all types.
    pub event_types: Vec<EventType>,
    /// Source nodes to include. Empty means all nodes.
    pub source_nodes: Vec<NodeId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            ..Self::default()
        }
    }

    /// Create a filter for specific event types.
    #[must_use]
    pub fn event_types(event_types: Vec<EventType>) -> Self {
        Self {
            event_types,
            ..Self::default()
        }
    }

    /// Create a filter for events from specific nodes.
    #[must_use]
    pub fn from_nodes(nodes: Vec<NodeId>) -> Self {
        Self {
            source_nodes: nodes,
            ..Self::default()
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SimulationEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let type_match =
            self.event_types.is_empty() || self.event_types.contains(&event.event_type);

        let source_match =
            self.source_nodes.is_empty() || self.source_nodes.contains(&event.source_node);

        topic_match && type_match && source_match
    }
}
