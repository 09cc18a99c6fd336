//! # Qubits in flight
//!
//! A [`Qubit`] is either a standalone one-qubit state or one half of a
//! tracked Bell pair. Halves are plain values: each carries the pair's joint
//! state with its own local operations applied, plus the list of those
//! operations. Local operations on different halves commute, so the true joint
//! state is recovered exactly when both halves meet again.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use shared_types::entities::{Basis, BellOutcome, Bit};
use uuid::Uuid;

use super::errors::StateResult;
use super::measurement;
use super::operator::Operator;
use super::state::{BellState, QuantumState};

/// Identity of a generated Bell pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairId(pub Uuid);

impl PairId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PairId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LocalOp {
    Unitary(Operator),
    Kraus(Vec<Operator>),
}

#[derive(Debug, Clone, PartialEq)]
enum Repr {
    Single(QuantumState),
    Half {
        pair: PairId,
        index: usize,
        joint: QuantumState,
        ops: Vec<LocalOp>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Qubit {
    repr: Repr,
}

impl Qubit {
    pub fn new(state: QuantumState) -> Self {
        Self {
            repr: Repr::Single(state),
        }
    }

    pub fn prepare(basis: Basis, bit: Bit) -> Self {
        Self::new(QuantumState::prepare(basis, bit))
    }

    /// Both halves of a fresh Bell pair, qubit 0 first.
    pub fn bell_pair(which: BellState) -> (Self, Self) {
        let pair = PairId::new();
        let joint = QuantumState::bell(which);
        let half = |index| Self {
            repr: Repr::Half {
                pair,
                index,
                joint: joint.clone(),
                ops: Vec::new(),
            },
        };
        (half(0), half(1))
    }

    pub fn pair_id(&self) -> Option<PairId> {
        match &self.repr {
            Repr::Single(_) => None,
            Repr::Half { pair, .. } => Some(*pair),
        }
    }

    pub fn is_pair_half(&self) -> bool {
        self.pair_id().is_some()
    }

    /// The one-qubit state an observer of this qubit alone would see.
    pub fn reduced_state(&self) -> StateResult<QuantumState> {
        match &self.repr {
            Repr::Single(state) => Ok(state.clone()),
            Repr::Half { index, joint, .. } => joint.partial_trace(&[*index]),
        }
    }

    pub fn apply_unitary(&mut self, unitary: &Operator) -> StateResult<()> {
        match &mut self.repr {
            Repr::Single(state) => *state = state.apply_unitary(unitary)?,
            Repr::Half {
                index, joint, ops, ..
            } => {
                *joint = joint.apply_on_subsystem(unitary, *index)?;
                ops.push(LocalOp::Unitary(unitary.clone()));
            }
        }
        Ok(())
    }

    pub fn apply_kraus(&mut self, kraus: &[Operator]) -> StateResult<()> {
        match &mut self.repr {
            Repr::Single(state) => *state = state.apply_kraus(kraus)?,
            Repr::Half {
                index, joint, ops, ..
            } => {
                *joint = joint.apply_kraus_on_subsystem(kraus, *index)?;
                ops.push(LocalOp::Kraus(kraus.to_vec()));
            }
        }
        Ok(())
    }

    /// Projective measurement; the qubit is consumed.
    pub fn measure<R: Rng + ?Sized>(self, basis: Basis, rng: &mut R) -> StateResult<Bit> {
        measurement::measure(&self.reduced_state()?, basis, rng)
    }

    /// Joint two-qubit state of `a` and `b`, in that order.
    ///
    /// Halves of the same pair yield their entangled state; anything else is
    /// the product of the reduced states.
    pub fn joint_state(a: &Qubit, b: &Qubit) -> StateResult<QuantumState> {
        if let (
            Repr::Half {
                pair: pa,
                index: ia,
                joint,
                ..
            },
            Repr::Half {
                pair: pb,
                index: ib,
                ops,
                ..
            },
        ) = (&a.repr, &b.repr)
        {
            if pa == pb && ia != ib {
                let mut state = joint.clone();
                for op in ops {
                    state = match op {
                        LocalOp::Unitary(u) => state.apply_on_subsystem(u, *ib)?,
                        LocalOp::Kraus(k) => state.apply_kraus_on_subsystem(k, *ib)?,
                    };
                }
                // Bell overlaps are invariant under exchanging the two qubits.
                return Ok(state);
            }
        }
        Ok(a.reduced_state()?.tensor(&b.reduced_state()?))
    }

    /// Bell-basis measurement of two qubits; both are consumed.
    pub fn bell_measurement<R: Rng + ?Sized>(
        a: Qubit,
        b: Qubit,
        rng: &mut R,
    ) -> StateResult<BellOutcome> {
        measurement::bell_measure(&Self::joint_state(&a, &b)?, rng)
    }
}
