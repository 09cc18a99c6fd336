//! # Error Types
//!
//! The simulation-wide error taxonomy. Component crates define their own
//! errors and convert into [`SimulationError`] so that a node worker can
//! catch everything at one boundary.

use thiserror::Error;

use crate::entities::{NodeId, ProtocolMode};

/// Errors that can occur while building or running a simulation.
///
/// Everything except [`SimulationError::MalformedTopology`] is node-local:
/// the worker logs it, publishes an event and keeps running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// No classical path exists between two nodes.
    #[error("No route from {from} to {to}")]
    RouteNotFound { from: NodeId, to: NodeId },

    /// A route exists but there is no physical link to the next hop.
    #[error("No connection from {from} to next hop {to}")]
    ConnectionNotFound { from: NodeId, to: NodeId },

    /// A quantum host tried to start a protocol round without a channel.
    #[error("Node {0} has no quantum channel")]
    ChannelNotFound(NodeId),

    /// A message or qubit reached a node configured for another protocol.
    #[error("Node {node} runs {actual} but received a {expected} message")]
    ProtocolModeMismatch {
        node: NodeId,
        expected: ProtocolMode,
        actual: ProtocolMode,
    },

    /// Repeater memory at capacity; the qubit was dropped.
    #[error("Repeater {node} memory full ({capacity} slots)")]
    MemoryFull { node: NodeId, capacity: usize },

    /// A correction or message referenced a partner that does not match.
    #[error("Stale handshake at {node}: expected partner {expected:?}, message names {received}")]
    StaleHandshake {
        node: NodeId,
        expected: Option<NodeId>,
        received: NodeId,
    },

    /// A protocol message arrived out of order or with malformed content.
    #[error("Protocol violation at {node}: {reason}")]
    ProtocolViolation { node: NodeId, reason: String },

    /// A node's inbox refused the hand-off (full or shut down).
    #[error("Delivery to {to} failed: {reason}")]
    DeliveryFailed { to: NodeId, reason: String },

    /// A state-vector operation failed (dimension mismatch, zero norm).
    #[error("Invalid quantum state: {0}")]
    InvalidQuantumState(String),

    /// A command named a node that is not part of the running simulation.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The topology description failed validation. Fatal to the whole run.
    #[error("Malformed topology: {0}")]
    MalformedTopology(String),
}

impl SimulationError {
    /// Whether this error aborts the simulation instead of a single packet/round.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MalformedTopology(_))
    }
}
