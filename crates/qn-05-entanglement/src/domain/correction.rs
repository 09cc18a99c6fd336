//! Pauli corrections keyed by Bell-measurement outcome.

use std::fmt;

use qn_02_quantum_state::{Operator, StateResult};
use serde::{Deserialize, Serialize};
use shared_types::entities::BellOutcome;

/// `(0,0)→I`, `(0,1)→X`, `(1,0)→Z`, `(1,1)→Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliCorrection {
    I,
    X,
    Z,
    Y,
}

impl PauliCorrection {
    pub fn from_outcome(outcome: BellOutcome) -> Self {
        match outcome {
            BellOutcome(0, 0) => Self::I,
            BellOutcome(0, 1) => Self::X,
            BellOutcome(1, 0) => Self::Z,
            _ => Self::Y,
        }
    }

    /// Operator applied to the retained half. `Y` is the product `X·Z`.
    pub fn operator(self) -> StateResult<Operator> {
        match self {
            Self::I => Ok(Operator::identity(2)),
            Self::X => Ok(Operator::pauli_x()),
            Self::Z => Ok(Operator::pauli_z()),
            Self::Y => Operator::pauli_x().mul(&Operator::pauli_z()),
        }
    }
}

impl fmt::Display for PauliCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::I => "I",
            Self::X => "X",
            Self::Z => "Z",
            Self::Y => "Y",
        };
        f.write_str(s)
    }
}
