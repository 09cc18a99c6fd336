//! Square complex matrices acting on qubit registers.
//!
//! Qubit 0 is the most significant bit of a basis index, so `|ab⟩` lives at
//! index `2a + b`.

use std::f64::consts::FRAC_1_SQRT_2;
use std::ops::Mul;

use num_complex::Complex64;

use super::errors::{StateError, StateResult};
use super::ket::Ket;

pub(crate) const ZERO: Complex64 = Complex64::new(0.0, 0.0);
pub(crate) const ONE: Complex64 = Complex64::new(1.0, 0.0);
pub(crate) const I: Complex64 = Complex64::new(0.0, 1.0);

/// Row-major square matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    dim: usize,
    data: Vec<Complex64>,
}

impl Operator {
    pub fn new(dim: usize, data: Vec<Complex64>) -> StateResult<Self> {
        if data.len() != dim * dim {
            return Err(StateError::DimensionMismatch {
                expected: dim * dim,
                actual: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    pub(crate) fn from_2x2(m: [Complex64; 4]) -> Self {
        Self {
            dim: 2,
            data: m.to_vec(),
        }
    }

    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![ZERO; dim * dim],
        }
    }

    pub fn identity(dim: usize) -> Self {
        let mut op = Self::zeros(dim);
        for i in 0..dim {
            op.data[i * dim + i] = ONE;
        }
        op
    }

    /// Real diagonal matrix.
    pub fn diagonal(entries: &[f64]) -> Self {
        let mut op = Self::zeros(entries.len());
        for (i, &e) in entries.iter().enumerate() {
            op.data[i * entries.len() + i] = Complex64::new(e, 0.0);
        }
        op
    }

    pub fn pauli_x() -> Self {
        Self::from_2x2([ZERO, ONE, ONE, ZERO])
    }

    pub fn pauli_y() -> Self {
        Self::from_2x2([ZERO, -I, I, ZERO])
    }

    pub fn pauli_z() -> Self {
        Self::from_2x2([ONE, ZERO, ZERO, -ONE])
    }

    pub fn hadamard() -> Self {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        Self::from_2x2([h, h, h, -h])
    }

    /// `|ket⟩⟨ket|`
    pub fn projector(ket: &Ket) -> Self {
        let amps = ket.amplitudes();
        let dim = amps.len();
        let mut op = Self::zeros(dim);
        for r in 0..dim {
            for c in 0..dim {
                op.data[r * dim + c] = amps[r] * amps[c].conj();
            }
        }
        op
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    pub(crate) fn add_at(&mut self, row: usize, col: usize, value: Complex64) {
        self.data[row * self.dim + col] += value;
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            dim: self.dim,
            data: self.data.iter().map(|v| v.scale(factor)).collect(),
        }
    }

    /// Entrywise sum; both operators must share a dimension.
    pub fn add(&self, other: &Operator) -> StateResult<Self> {
        self.check_dim(other.dim)?;
        Ok(Self {
            dim: self.dim,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a + b)
                .collect(),
        })
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Self {
        let n = self.dim;
        let mut out = Self::zeros(n);
        for r in 0..n {
            for c in 0..n {
                out.data[c * n + r] = self.data[r * n + c].conj();
            }
        }
        out
    }

    /// Matrix product `self · other`.
    pub fn mul(&self, other: &Operator) -> StateResult<Self> {
        self.check_dim(other.dim)?;
        let n = self.dim;
        let mut out = Self::zeros(n);
        for r in 0..n {
            for k in 0..n {
                let a = self.data[r * n + k];
                if a == ZERO {
                    continue;
                }
                for c in 0..n {
                    out.data[r * n + c] += a * other.data[k * n + c];
                }
            }
        }
        Ok(out)
    }

    /// Tensor product `self ⊗ other`.
    pub fn kron(&self, other: &Operator) -> Self {
        let (n, m) = (self.dim, other.dim);
        let dim = n * m;
        let mut out = Self::zeros(dim);
        for r1 in 0..n {
            for c1 in 0..n {
                let a = self.data[r1 * n + c1];
                for r2 in 0..m {
                    for c2 in 0..m {
                        out.data[(r1 * m + r2) * dim + c1 * m + c2] = a * other.data[r2 * m + c2];
                    }
                }
            }
        }
        out
    }

    /// Lift a single-qubit operator onto qubit `target` of an `num_qubits` register.
    pub fn embed(&self, target: usize, num_qubits: usize) -> StateResult<Self> {
        self.check_dim(2)?;
        if target >= num_qubits {
            return Err(StateError::SubsystemOutOfRange {
                index: target,
                num_qubits,
            });
        }
        let mut out = Self::identity(1);
        for q in 0..num_qubits {
            out = if q == target {
                out.kron(self)
            } else {
                out.kron(&Self::identity(2))
            };
        }
        Ok(out)
    }

    /// `self |ket⟩`, unnormalized.
    pub fn apply(&self, ket: &Ket) -> StateResult<Vec<Complex64>> {
        let amps = ket.amplitudes();
        self.check_dim(amps.len())?;
        let n = self.dim;
        Ok((0..n)
            .map(|r| (0..n).map(|c| self.data[r * n + c] * amps[c]).sum())
            .collect())
    }

    pub fn trace(&self) -> Complex64 {
        (0..self.dim).map(|i| self.data[i * self.dim + i]).sum()
    }

    /// Entrywise comparison within `tol`.
    pub fn approx_eq(&self, other: &Operator, tol: f64) -> bool {
        self.dim == other.dim
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).norm() <= tol)
    }

    fn check_dim(&self, dim: usize) -> StateResult<()> {
        if self.dim == dim {
            Ok(())
        } else {
            Err(StateError::DimensionMismatch {
                expected: self.dim,
                actual: dim,
            })
        }
    }
}

impl Mul for &Operator {
    type Output = StateResult<Operator>;

    fn mul(self, rhs: &Operator) -> Self::Output {
        Operator::mul(self, rhs)
    }
}
