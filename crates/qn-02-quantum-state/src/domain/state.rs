//! # Quantum State
//!
//! A state is kept as a ket while it stays pure and degrades to a density
//! matrix the first time noise or a partial trace touches it.

use std::f64::consts::FRAC_1_SQRT_2;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use shared_types::entities::{Basis, BellOutcome, Bit};

use super::density::DensityMatrix;
use super::errors::{StateError, StateResult};
use super::ket::Ket;
use super::operator::Operator;

/// The four Bell states, in measurement index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BellState {
    PhiPlus,
    PsiPlus,
    PhiMinus,
    PsiMinus,
}

impl BellState {
    pub const ALL: [BellState; 4] = [
        BellState::PhiPlus,
        BellState::PsiPlus,
        BellState::PhiMinus,
        BellState::PsiMinus,
    ];

    pub fn ket(self) -> Ket {
        let h = FRAC_1_SQRT_2;
        let amps = match self {
            Self::PhiPlus => [h, 0.0, 0.0, h],
            Self::PsiPlus => [0.0, h, h, 0.0],
            Self::PhiMinus => [h, 0.0, 0.0, -h],
            Self::PsiMinus => [0.0, h, -h, 0.0],
        };
        // Fixed, normalized amplitudes.
        Ket::new(amps.iter().map(|&a| Complex64::new(a, 0.0)).collect())
            .unwrap_or_else(|_| Ket::zero().kron(&Ket::zero()))
    }

    pub fn outcome(self) -> BellOutcome {
        BellOutcome::from_index(self as usize)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuantumState {
    Pure(Ket),
    Mixed(DensityMatrix),
}

impl QuantumState {
    /// Single qubit encoding `bit` in `basis`.
    pub fn prepare(basis: Basis, bit: Bit) -> Self {
        Self::Pure(Ket::basis_state(basis, bit))
    }

    pub fn bell(which: BellState) -> Self {
        Self::Pure(which.ket())
    }

    pub fn maximally_mixed(num_qubits: usize) -> Self {
        Self::Mixed(DensityMatrix::maximally_mixed(num_qubits))
    }

    pub fn num_qubits(&self) -> usize {
        match self {
            Self::Pure(k) => k.num_qubits(),
            Self::Mixed(m) => m.num_qubits(),
        }
    }

    pub fn is_pure(&self) -> bool {
        matches!(self, Self::Pure(_))
    }

    pub fn to_density(&self) -> DensityMatrix {
        match self {
            Self::Pure(k) => DensityMatrix::from_ket(k),
            Self::Mixed(m) => m.clone(),
        }
    }

    /// `self ⊗ other`; stays pure only if both sides are.
    pub fn tensor(&self, other: &QuantumState) -> Self {
        match (self, other) {
            (Self::Pure(a), Self::Pure(b)) => Self::Pure(a.kron(b)),
            _ => Self::Mixed(self.to_density().kron(&other.to_density())),
        }
    }

    /// Reduced state over the qubits in `keep`.
    pub fn partial_trace(&self, keep: &[usize]) -> StateResult<Self> {
        Ok(Self::Mixed(self.to_density().partial_trace(keep)?))
    }

    /// Probability of finding the state in `ket`.
    pub fn probability_of(&self, ket: &Ket) -> StateResult<f64> {
        match self {
            Self::Pure(k) => Ok(k.inner(ket)?.norm_sqr()),
            Self::Mixed(m) => m.expectation(ket),
        }
    }

    pub fn apply_unitary(&self, unitary: &Operator) -> StateResult<Self> {
        match self {
            Self::Pure(k) => Ok(Self::Pure(Ket::new(unitary.apply(k)?)?)),
            Self::Mixed(m) => Ok(Self::Mixed(m.conjugate_by(unitary)?)),
        }
    }

    pub fn apply_kraus(&self, kraus: &[Operator]) -> StateResult<Self> {
        Ok(Self::Mixed(self.to_density().apply_kraus(kraus)?))
    }

    /// Apply a single-qubit unitary to qubit `target`.
    pub fn apply_on_subsystem(&self, op: &Operator, target: usize) -> StateResult<Self> {
        self.apply_unitary(&op.embed(target, self.num_qubits())?)
    }

    /// Apply a single-qubit Kraus set to qubit `target`.
    pub fn apply_kraus_on_subsystem(&self, kraus: &[Operator], target: usize) -> StateResult<Self> {
        let n = self.num_qubits();
        let lifted = kraus
            .iter()
            .map(|k| k.embed(target, n))
            .collect::<StateResult<Vec<_>>>()?;
        self.apply_kraus(&lifted)
    }

    /// Outcome probabilities for a projective measurement of a single qubit.
    pub fn basis_probabilities(&self, basis: Basis) -> StateResult<[f64; 2]> {
        self.require_qubits(1)?;
        let p0 = self.probability_of(&Ket::basis_state(basis, 0))?.clamp(0.0, 1.0);
        Ok([p0, 1.0 - p0])
    }

    /// Overlap with each Bell state, in [`BellState::ALL`] order.
    pub fn bell_probabilities(&self) -> StateResult<[f64; 4]> {
        self.require_qubits(2)?;
        let mut probs = [0.0; 4];
        for (slot, bell) in probs.iter_mut().zip(BellState::ALL) {
            *slot = self.probability_of(&bell.ket())?.max(0.0);
        }
        Ok(probs)
    }

    fn require_qubits(&self, n: usize) -> StateResult<()> {
        if self.num_qubits() == n {
            Ok(())
        } else {
            Err(StateError::DimensionMismatch {
                expected: 1 << n,
                actual: 1 << self.num_qubits(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_prepare_and_probability() {
        let plus = QuantumState::prepare(Basis::Diagonal, 0);
        let [p0, p1] = plus.basis_probabilities(Basis::Rectilinear).unwrap();
        assert!((p0 - 0.5).abs() < TOL && (p1 - 0.5).abs() < TOL);
        let [q0, _] = plus.basis_probabilities(Basis::Diagonal).unwrap();
        assert!((q0 - 1.0).abs() < TOL);
    }

    #[test]
    fn test_bell_state_projects_onto_itself() {
        for bell in BellState::ALL {
            let probs = QuantumState::bell(bell).bell_probabilities().unwrap();
            for (i, p) in probs.iter().enumerate() {
                let expected = if i == bell as usize { 1.0 } else { 0.0 };
                assert!((p - expected).abs() < TOL, "{bell:?} slot {i}: {p}");
            }
        }
    }

    #[test]
    fn test_bell_half_is_maximally_mixed() {
        let half = QuantumState::bell(BellState::PhiPlus)
            .partial_trace(&[0])
            .unwrap();
        assert!((half.probability_of(&Ket::zero()).unwrap() - 0.5).abs() < TOL);
        assert!((half.to_density().purity().unwrap() - 0.5).abs() < TOL);
    }

    #[test]
    fn test_x_on_second_qubit_maps_phi_to_psi() {
        let psi = QuantumState::bell(BellState::PhiPlus)
            .apply_on_subsystem(&Operator::pauli_x(), 1)
            .unwrap();
        let probs = psi.bell_probabilities().unwrap();
        assert!((probs[BellState::PsiPlus as usize] - 1.0).abs() < TOL);
    }

    #[test]
    fn test_tensor_of_mixed_and_pure() {
        let mixed = QuantumState::maximally_mixed(1);
        let joint = mixed.tensor(&QuantumState::prepare(Basis::Rectilinear, 1));
        assert_eq!(joint.num_qubits(), 2);
        assert!(!joint.is_pure());
        let second = joint.partial_trace(&[1]).unwrap();
        assert!((second.probability_of(&Ket::one()).unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn test_bell_outcome_order() {
        assert_eq!(BellState::PhiPlus.outcome(), BellOutcome(0, 0));
        assert_eq!(BellState::PsiPlus.outcome(), BellOutcome(0, 1));
        assert_eq!(BellState::PhiMinus.outcome(), BellOutcome(1, 0));
        assert_eq!(BellState::PsiMinus.outcome(), BellOutcome(1, 1));
    }
}
