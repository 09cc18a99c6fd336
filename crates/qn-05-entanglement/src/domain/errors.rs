//! Entanglement-swapping error types.

use qn_02_quantum_state::StateError;
use shared_types::entities::NodeId;
use shared_types::errors::SimulationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntanglementError {
    #[error("{node}: correction names {received}, expected {expected:?}")]
    StaleHandshake {
        node: NodeId,
        expected: Option<NodeId>,
        received: NodeId,
    },

    #[error("{0}: correction received but no qubit is stored")]
    NoStoredQubit(NodeId),

    #[error("repeater {node}: memory full ({capacity} slots)")]
    MemoryFull { node: NodeId, capacity: usize },

    #[error("repeater {repeater}: no end host beyond {neighbor}")]
    EndHostNotFound { repeater: NodeId, neighbor: NodeId },

    #[error(transparent)]
    State(#[from] StateError),
}

impl EntanglementError {
    pub fn into_simulation_error(self, node: &NodeId) -> SimulationError {
        match self {
            Self::StaleHandshake {
                node,
                expected,
                received,
            } => SimulationError::StaleHandshake {
                node,
                expected,
                received,
            },
            Self::MemoryFull { node, capacity } => SimulationError::MemoryFull { node, capacity },
            Self::State(e) => SimulationError::InvalidQuantumState(e.to_string()),
            other => SimulationError::ProtocolViolation {
                node: node.clone(),
                reason: other.to_string(),
            },
        }
    }
}
