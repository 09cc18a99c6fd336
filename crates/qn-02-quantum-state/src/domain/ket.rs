//! Normalized pure state vectors.

use std::f64::consts::FRAC_1_SQRT_2;

use num_complex::Complex64;
use shared_types::entities::{Basis, Bit};

use super::errors::{StateError, StateResult};
use super::operator::{ONE, ZERO};

#[derive(Debug, Clone, PartialEq)]
pub struct Ket {
    amps: Vec<Complex64>,
}

impl Ket {
    /// Normalize `amps` into a state vector over `log2(len)` qubits.
    pub fn new(amps: Vec<Complex64>) -> StateResult<Self> {
        if amps.is_empty() || !amps.len().is_power_of_two() {
            return Err(StateError::NotQubitDimension(amps.len()));
        }
        let norm = amps.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
        if norm < f64::EPSILON {
            return Err(StateError::ZeroNorm);
        }
        Ok(Self {
            amps: amps.into_iter().map(|a| a.unscale(norm)).collect(),
        })
    }

    fn real(a: f64, b: f64) -> Self {
        Self {
            amps: vec![Complex64::new(a, 0.0), Complex64::new(b, 0.0)],
        }
    }

    pub fn zero() -> Self {
        Self { amps: vec![ONE, ZERO] }
    }

    pub fn one() -> Self {
        Self { amps: vec![ZERO, ONE] }
    }

    pub fn plus() -> Self {
        Self::real(FRAC_1_SQRT_2, FRAC_1_SQRT_2)
    }

    pub fn minus() -> Self {
        Self::real(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)
    }

    /// Eigenstate of `basis` encoding `bit`: Z → |0⟩/|1⟩, X → |+⟩/|−⟩.
    pub fn basis_state(basis: Basis, bit: Bit) -> Self {
        match (basis, bit) {
            (Basis::Rectilinear, 0) => Self::zero(),
            (Basis::Rectilinear, _) => Self::one(),
            (Basis::Diagonal, 0) => Self::plus(),
            (Basis::Diagonal, _) => Self::minus(),
        }
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    pub fn dim(&self) -> usize {
        self.amps.len()
    }

    pub fn num_qubits(&self) -> usize {
        self.amps.len().trailing_zeros() as usize
    }

    /// `⟨self|other⟩`
    pub fn inner(&self, other: &Ket) -> StateResult<Complex64> {
        if self.dim() != other.dim() {
            return Err(StateError::DimensionMismatch {
                expected: self.dim(),
                actual: other.dim(),
            });
        }
        Ok(self
            .amps
            .iter()
            .zip(&other.amps)
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// `self ⊗ other`
    pub fn kron(&self, other: &Ket) -> Self {
        let amps = self
            .amps
            .iter()
            .flat_map(|a| other.amps.iter().map(move |b| a * b))
            .collect();
        Self { amps }
    }
}
