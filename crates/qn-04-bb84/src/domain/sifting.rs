//! Pure helpers for basis reconciliation and error estimation.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared_types::entities::{Basis, Bit};
use shared_types::messages::SampledBit;

use super::errors::Bb84Error;

/// One qubit of a round: the basis used and the bit sent or measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisRecord {
    pub basis: Basis,
    pub bit: Bit,
}

/// Indices at which both parties used the same basis.
pub fn reconcile(own: &[Basis], theirs: &[Basis]) -> Result<Vec<usize>, Bb84Error> {
    if own.len() != theirs.len() {
        return Err(Bb84Error::LengthMismatch {
            own: own.len(),
            theirs: theirs.len(),
        });
    }
    Ok(own
        .iter()
        .zip(theirs)
        .enumerate()
        .filter_map(|(i, (a, b))| (a == b).then_some(i))
        .collect())
}

/// Fraction of sampled bits that disagree with `own`; 0 for an empty sample.
pub fn estimate_error_rate(own: &[BasisRecord], sample: &[SampledBit]) -> Result<f64, Bb84Error> {
    if sample.is_empty() {
        return Ok(0.0);
    }
    let mut mismatches = 0usize;
    for s in sample {
        let record = own.get(s.index).ok_or(Bb84Error::IndexOutOfRange {
            index: s.index,
            len: own.len(),
        })?;
        if record.bit != s.bit {
            mismatches += 1;
        }
    }
    Ok(mismatches as f64 / sample.len() as f64)
}

/// Uniform in `2..=max(2, num_bits / 4)`, capped by `available`.
pub fn sample_size<R: Rng + ?Sized>(num_bits: usize, available: usize, rng: &mut R) -> usize {
    let upper = (num_bits / 4).max(2);
    rng.gen_range(2..=upper).min(available)
}

/// Random subset of the shared indices, disclosed with their bits.
pub fn draw_sample<R: Rng + ?Sized>(
    records: &[BasisRecord],
    shared: &[usize],
    num_bits: usize,
    rng: &mut R,
) -> Vec<SampledBit> {
    let size = sample_size(num_bits, shared.len(), rng);
    index::sample(rng, shared.len(), size)
        .into_iter()
        .filter_map(|pos| {
            let i = shared[pos];
            records.get(i).map(|r| SampledBit { bit: r.bit, index: i })
        })
        .collect()
}
