//! Single-qubit noise channels as Kraus sets.
//!
//! Each set satisfies `Σ K†K = I`. Probabilities are clamped to `[0, 1]`.

use num_complex::Complex64;

use super::operator::{Operator, ZERO};

fn clamp(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Replace the state with `I/2` with probability `p`.
pub fn depolarizing(p: f64) -> Vec<Operator> {
    let p = clamp(p);
    vec![
        Operator::identity(2).scale((1.0 - 0.75 * p).sqrt()),
        Operator::pauli_x().scale((p / 4.0).sqrt()),
        Operator::pauli_y().scale((p / 4.0).sqrt()),
        Operator::pauli_z().scale((p / 4.0).sqrt()),
    ]
}

/// Apply Z with probability `p`.
pub fn dephasing(p: f64) -> Vec<Operator> {
    let p = clamp(p);
    vec![
        Operator::identity(2).scale((1.0 - p).sqrt()),
        Operator::pauli_z().scale(p.sqrt()),
    ]
}

/// Apply X with probability `p`.
pub fn bit_flip(p: f64) -> Vec<Operator> {
    let p = clamp(p);
    vec![
        Operator::identity(2).scale((1.0 - p).sqrt()),
        Operator::pauli_x().scale(p.sqrt()),
    ]
}

/// Decay `|1⟩ → |0⟩` with probability `gamma`.
pub fn amplitude_damping(gamma: f64) -> Vec<Operator> {
    let gamma = clamp(gamma);
    let k1 = Operator::from_2x2([ZERO, Complex64::new(gamma.sqrt(), 0.0), ZERO, ZERO]);
    vec![Operator::diagonal(&[1.0, (1.0 - gamma).sqrt()]), k1]
}

/// Erasure toward the maximally mixed state: survives with probability `survival`.
pub fn erasure(survival: f64) -> Vec<Operator> {
    depolarizing(1.0 - clamp(survival))
}

/// Identity channel.
pub fn identity() -> Vec<Operator> {
    vec![Operator::identity(2)]
}
