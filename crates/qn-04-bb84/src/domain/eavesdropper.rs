//! Intercept-resend relay.
//!
//! A quantum host wired to exactly two quantum channels sits between the two
//! parties. Every qubit it sees is measured in a random basis, re-prepared
//! from the result and pushed out the other channel.

use qn_02_quantum_state::Qubit;
use qn_03_channels::{ChannelId, QuantumChannel};
use rand::Rng;
use shared_types::entities::{Basis, NodeId};
use tracing::trace;

use super::errors::Bb84Error;
use super::sifting::BasisRecord;

#[derive(Debug, Clone)]
pub struct InterceptResend {
    node: NodeId,
    records: Vec<BasisRecord>,
}

impl InterceptResend {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            records: Vec::new(),
        }
    }

    /// Everything measured so far, in arrival order.
    pub fn records(&self) -> &[BasisRecord] {
        &self.records
    }

    pub fn intercepted(&self) -> usize {
        self.records.len()
    }

    /// Measure `qubit` in a random basis and return a fresh copy of the result.
    pub fn intercept<R: Rng + ?Sized>(&mut self, qubit: Qubit, rng: &mut R) -> Result<Qubit, Bb84Error> {
        let basis = Basis::from_coin(rng.gen());
        let bit = qubit.measure(basis, rng)?;
        self.records.push(BasisRecord { basis, bit });
        trace!(node = %self.node, %basis, bit, "[qn-04] Qubit intercepted");
        Ok(Qubit::prepare(basis, bit))
    }

    /// The channel opposite the one a qubit arrived on.
    ///
    /// `None` unless the relay has exactly two channels.
    pub fn forward_channel<'a>(
        channels: &'a [QuantumChannel],
        arrived_on: &ChannelId,
    ) -> Option<&'a QuantumChannel> {
        match channels {
            [a, b] if &a.id == arrived_on => Some(b),
            [a, b] if &b.id == arrived_on => Some(a),
            _ => None,
        }
    }
}
