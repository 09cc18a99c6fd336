//! Probabilistic measurement.

use rand::Rng;
use shared_types::entities::{Basis, BellOutcome, Bit};

use super::errors::{StateError, StateResult};
use super::state::QuantumState;

/// Projective measurement of a single qubit in `basis`.
///
/// Outcome 0 is drawn with probability `⟨b0|ρ|b0⟩`.
pub fn measure<R: Rng + ?Sized>(
    state: &QuantumState,
    basis: Basis,
    rng: &mut R,
) -> StateResult<Bit> {
    let [p0, _] = state.basis_probabilities(basis)?;
    Ok(if rng.gen::<f64>() < p0 { 0 } else { 1 })
}

/// Project a two-qubit state onto the Bell basis.
pub fn bell_measure<R: Rng + ?Sized>(state: &QuantumState, rng: &mut R) -> StateResult<BellOutcome> {
    let probs = state.bell_probabilities()?;
    Ok(BellOutcome::from_index(sample_index(&probs, rng)?))
}

/// Draw an index with probability proportional to its weight.
pub fn sample_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> StateResult<usize> {
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(StateError::InvalidProbability(total));
    }
    let mut point = rng.gen::<f64>() * total;
    for (i, &w) in weights.iter().enumerate() {
        if point < w {
            return Ok(i);
        }
        point -= w;
    }
    // Rounding left `point` just past the end; take the last non-zero slot.
    Ok(weights.iter().rposition(|&w| w > 0.0).unwrap_or(0))
}
