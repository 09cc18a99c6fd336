//! # Quantum Channel
//!
//! Symmetric link carrying qubits between two fixed endpoints. Transmission
//! first applies fibre loss as an erasure toward the maximally mixed state,
//! then the named noise model, then hands the qubit to the receiver's inbox
//! tagged with the channel it arrived on.
//!
//! `num_bits` and `error_rate_threshold` are carried for the key-agreement
//! engine; the channel never enforces them.

use qn_01_topology::{Edge, EdgeKind, NoiseModel};
use qn_02_quantum_state::{noise, Operator, Qubit};
use shared_types::entities::NodeId;
use tracing::trace;

use super::errors::ChannelError;
use super::inbound::{ChannelId, Inbound};
use crate::ports::InboxSink;

#[derive(Debug, Clone, PartialEq)]
pub struct QuantumChannel {
    pub id: ChannelId,
    pub name: String,
    pub endpoints: (NodeId, NodeId),
    pub length: f64,
    pub loss_per_km: f64,
    pub noise_model: NoiseModel,
    pub noise_strength: f64,
    pub num_bits: usize,
    pub error_rate_threshold: f64,
    /// Created by entanglement swapping rather than the topology.
    pub logical: bool,
}

/// What happened to a qubit on its way through the channel.
#[derive(Debug)]
pub struct Propagation {
    pub qubit: Qubit,
    pub altered: bool,
}

impl QuantumChannel {
    /// Channel for a quantum edge; `None` for classical edges.
    pub fn from_edge(edge: &Edge) -> Option<Self> {
        match &edge.kind {
            EdgeKind::Quantum(p) => Some(Self {
                id: ChannelId::Edge(edge.id),
                name: edge.name.clone(),
                endpoints: edge.endpoints.clone(),
                length: p.length,
                loss_per_km: p.loss_per_km,
                noise_model: p.noise_model,
                noise_strength: p.noise_strength,
                num_bits: p.num_bits,
                error_rate_threshold: p.error_rate_threshold,
                logical: false,
            }),
            EdgeKind::Classical(_) => None,
        }
    }

    /// Noiseless, lossless logical link produced by a successful swap.
    pub fn entangled(a: NodeId, b: NodeId, num_bits: usize, error_rate_threshold: f64) -> Self {
        Self {
            id: ChannelId::Logical(a.clone(), b.clone()),
            name: format!("entangled {a} <-> {b}"),
            endpoints: (a, b),
            length: 1.0,
            loss_per_km: 0.0,
            noise_model: NoiseModel::None,
            noise_strength: 0.0,
            num_bits,
            error_rate_threshold,
            logical: true,
        }
    }

    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.endpoints.0 == a && &self.endpoints.1 == b)
            || (&self.endpoints.0 == b && &self.endpoints.1 == a)
    }

    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.endpoints.0 == node {
            Some(&self.endpoints.1)
        } else if &self.endpoints.1 == node {
            Some(&self.endpoints.0)
        } else {
            None
        }
    }

    pub fn attenuation_db(&self) -> f64 {
        self.loss_per_km * self.length
    }

    /// `10^(-dB/10)`
    pub fn survival_probability(&self) -> f64 {
        10f64.powf(-self.attenuation_db() / 10.0)
    }

    fn noise_kraus(&self) -> Option<Vec<Operator>> {
        let p = self.noise_strength;
        if p <= 0.0 {
            return None;
        }
        match self.noise_model {
            NoiseModel::None => None,
            NoiseModel::Depolarizing => Some(noise::depolarizing(p)),
            NoiseModel::Dephasing => Some(noise::dephasing(p)),
            NoiseModel::BitFlip => Some(noise::bit_flip(p)),
            NoiseModel::AmplitudeDamping => Some(noise::amplitude_damping(p)),
        }
    }

    /// Apply loss and noise to `qubit`.
    pub fn propagate(&self, mut qubit: Qubit) -> Result<Propagation, ChannelError> {
        let mut altered = false;

        let survival = self.survival_probability();
        if survival < 1.0 {
            qubit.apply_kraus(&noise::erasure(survival))?;
            altered = true;
        }
        if let Some(kraus) = self.noise_kraus() {
            qubit.apply_kraus(&kraus)?;
            altered = true;
        }
        Ok(Propagation { qubit, altered })
    }

    /// Send `qubit` from `sender` to the opposite endpoint.
    ///
    /// Returns whether loss or noise altered the state.
    pub fn transmit<S: InboxSink + ?Sized>(
        &self,
        qubit: Qubit,
        sender: &NodeId,
        sink: &S,
    ) -> Result<bool, ChannelError> {
        let receiver = self
            .other_end(sender)
            .ok_or_else(|| ChannelError::UnknownSender {
                channel: self.name.clone(),
                node: sender.clone(),
            })?
            .clone();

        let Propagation { qubit, altered } = self.propagate(qubit)?;
        trace!(channel = %self.id, from = %sender, to = %receiver, altered, "qubit in flight");
        sink.deliver(
            &receiver,
            Inbound::Qubit {
                qubit,
                from: sender.clone(),
                channel: self.id.clone(),
            },
        )?;
        Ok(altered)
    }
}
