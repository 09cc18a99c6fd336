//! Quantum state error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("dimension {0} is not a power of two")]
    NotQubitDimension(usize),

    #[error("state vector has zero norm")]
    ZeroNorm,

    #[error("qubit index {index} out of range for a {num_qubits}-qubit state")]
    SubsystemOutOfRange { index: usize, num_qubits: usize },

    #[error("measurement probabilities sum to {0}")]
    InvalidProbability(f64),
}

pub type StateResult<T> = Result<T, StateError>;
