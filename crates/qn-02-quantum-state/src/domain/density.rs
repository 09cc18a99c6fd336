//! Density matrices for mixed states.

use num_complex::Complex64;

use super::errors::{StateError, StateResult};
use super::ket::Ket;
use super::operator::Operator;

#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    rho: Operator,
    num_qubits: usize,
}

impl DensityMatrix {
    pub fn from_operator(rho: Operator) -> StateResult<Self> {
        let dim = rho.dim();
        if dim == 0 || !dim.is_power_of_two() {
            return Err(StateError::NotQubitDimension(dim));
        }
        Ok(Self {
            num_qubits: dim.trailing_zeros() as usize,
            rho,
        })
    }

    pub fn from_ket(ket: &Ket) -> Self {
        Self {
            rho: Operator::projector(ket),
            num_qubits: ket.num_qubits(),
        }
    }

    /// `I / 2^n`
    pub fn maximally_mixed(num_qubits: usize) -> Self {
        let dim = 1usize << num_qubits;
        Self {
            rho: Operator::identity(dim).scale(1.0 / dim as f64),
            num_qubits,
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.rho
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn trace(&self) -> f64 {
        self.rho.trace().re
    }

    /// `Tr(ρ²)`; 1 for pure states.
    pub fn purity(&self) -> StateResult<f64> {
        Ok(self.rho.mul(&self.rho)?.trace().re)
    }

    /// `⟨ket|ρ|ket⟩`
    pub fn expectation(&self, ket: &Ket) -> StateResult<f64> {
        let rho_ket = self.rho.apply(ket)?;
        let value: Complex64 = ket
            .amplitudes()
            .iter()
            .zip(&rho_ket)
            .map(|(a, b)| a.conj() * b)
            .sum();
        Ok(value.re)
    }

    /// `U ρ U†`
    pub fn conjugate_by(&self, unitary: &Operator) -> StateResult<Self> {
        let rho = unitary.mul(&self.rho)?.mul(&unitary.dagger())?;
        Ok(Self {
            rho,
            num_qubits: self.num_qubits,
        })
    }

    /// `Σ K ρ K†`
    pub fn apply_kraus(&self, kraus: &[Operator]) -> StateResult<Self> {
        let mut acc = Operator::zeros(self.rho.dim());
        for k in kraus {
            acc = acc.add(&k.mul(&self.rho)?.mul(&k.dagger())?)?;
        }
        Ok(Self {
            rho: acc,
            num_qubits: self.num_qubits,
        })
    }

    pub fn kron(&self, other: &DensityMatrix) -> Self {
        Self {
            rho: self.rho.kron(&other.rho),
            num_qubits: self.num_qubits + other.num_qubits,
        }
    }

    /// Trace out every qubit not listed in `keep`; kept qubits retain their order.
    pub fn partial_trace(&self, keep: &[usize]) -> StateResult<Self> {
        let n = self.num_qubits;
        if let Some(&bad) = keep.iter().find(|&&q| q >= n) {
            return Err(StateError::SubsystemOutOfRange {
                index: bad,
                num_qubits: n,
            });
        }
        let mut keep = keep.to_vec();
        keep.sort_unstable();
        keep.dedup();

        let bit = |idx: usize, q: usize| (idx >> (n - 1 - q)) & 1;
        let kept_index = |idx: usize| keep.iter().fold(0, |acc, &q| (acc << 1) | bit(idx, q));
        let traced_mask = (0..n)
            .filter(|q| !keep.contains(q))
            .fold(0usize, |acc, q| acc | (1 << (n - 1 - q)));

        let dim = 1usize << n;
        let mut out = Operator::zeros(1 << keep.len());
        for a in 0..dim {
            for b in 0..dim {
                if a & traced_mask == b & traced_mask {
                    out.add_at(kept_index(a), kept_index(b), self.rho.get(a, b));
                }
            }
        }
        Ok(Self {
            rho: out,
            num_qubits: keep.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_state_has_unit_purity() {
        let rho = DensityMatrix::from_ket(&Ket::plus());
        assert!((rho.trace() - 1.0).abs() < 1e-12);
        assert!((rho.purity().unwrap() - 1.0).abs() < 1e-12);
        assert!((rho.expectation(&Ket::plus()).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_maximally_mixed_purity() {
        let rho = DensityMatrix::maximally_mixed(1);
        assert!((rho.purity().unwrap() - 0.5).abs() < 1e-12);
        assert!((rho.expectation(&Ket::zero()).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_partial_trace_of_product_state() {
        let rho = DensityMatrix::from_ket(&Ket::one().kron(&Ket::plus()));
        let first = rho.partial_trace(&[0]).unwrap();
        let second = rho.partial_trace(&[1]).unwrap();
        assert!((first.expectation(&Ket::one()).unwrap() - 1.0).abs() < 1e-12);
        assert!((second.expectation(&Ket::plus()).unwrap() - 1.0).abs() < 1e-12);
        assert!(rho.partial_trace(&[2]).is_err());
    }

    #[test]
    fn test_conjugate_by_x_flips() {
        let rho = DensityMatrix::from_ket(&Ket::zero())
            .conjugate_by(&Operator::pauli_x())
            .unwrap();
        assert!((rho.expectation(&Ket::one()).unwrap() - 1.0).abs() < 1e-12);
    }
}
