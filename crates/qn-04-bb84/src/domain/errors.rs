//! BB84 error types.

use qn_02_quantum_state::StateError;
use shared_types::entities::NodeId;
use shared_types::errors::SimulationError;
use thiserror::Error;

use super::session::Bb84Phase;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Bb84Error {
    #[error("{node}: '{message}' not expected in phase {phase:?}")]
    OutOfPhase {
        node: NodeId,
        phase: Bb84Phase,
        message: &'static str,
    },

    #[error("{node}: message from {received}, but the round is with {expected}")]
    UnexpectedPeer {
        node: NodeId,
        expected: NodeId,
        received: NodeId,
    },

    #[error("basis lists differ in length: {own} local, {theirs} remote")]
    LengthMismatch { own: usize, theirs: usize },

    #[error("index {index} outside a round of {len} qubits")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("a round needs at least one qubit")]
    EmptyRound,

    #[error(transparent)]
    State(#[from] StateError),
}

impl Bb84Error {
    /// Convert with the node the error happened at.
    pub fn into_simulation_error(self, node: &NodeId) -> SimulationError {
        match self {
            Self::UnexpectedPeer {
                node,
                expected,
                received,
            } => SimulationError::StaleHandshake {
                node,
                expected: Some(expected),
                received,
            },
            Self::State(e) => SimulationError::InvalidQuantumState(e.to_string()),
            other => SimulationError::ProtocolViolation {
                node: node.clone(),
                reason: other.to_string(),
            },
        }
    }
}
