//! # Wire Messages
//!
//! Messages exchanged between simulated nodes over classical transport.
//!
//! - [`ControlMessage`]: key-agreement and entanglement control traffic between
//!   quantum hosts.
//! - [`ClassicDataPacket`]: routed application data with a hop trace.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Basis, BellOutcome, Bit, NodeId};

/// One entry of an error-estimation sample: the sender's bit at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledBit {
    pub bit: Bit,
    pub index: usize,
}

/// Classical control traffic between two quantum hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Receiver's measurement bases, index-aligned with the qubits it measured.
    ReconcileBases { bases: Vec<Basis> },
    /// Indices at which both parties used the same basis.
    SharedBasesIndices { indices: Vec<usize> },
    /// Random sample of the sender's bits at shared indices.
    EstimateErrorRate { sample: Vec<SampledBit> },
    /// Sample mismatch rate exceeded the threshold; the round failed.
    ErrorRate { rate: f64 },
    /// Sample mismatch rate was acceptable; both sides extract their key.
    Complete,
    /// Bell-measurement outcome sent by a repeater to one end host.
    EntanglementSwapCorrection {
        measurement_result: BellOutcome,
        other_node_address: NodeId,
    },
    /// Sent by the corrected host to its partner once the logical link exists.
    EntanglementEstablished { partner: NodeId, num_bits: usize },
}

impl ControlMessage {
    /// Short tag for logs and events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReconcileBases { .. } => "reconcile_bases",
            Self::SharedBasesIndices { .. } => "shared_bases_indices",
            Self::EstimateErrorRate { .. } => "estimate_error_rate",
            Self::ErrorRate { .. } => "error_rate",
            Self::Complete => "complete",
            Self::EntanglementSwapCorrection { .. } => "entanglement_swap_correction",
            Self::EntanglementEstablished { .. } => "entanglement_established",
        }
    }

    /// Whether this message belongs to the entanglement-swapping handshake.
    #[must_use]
    pub fn is_entanglement(&self) -> bool {
        matches!(
            self,
            Self::EntanglementSwapCorrection { .. } | Self::EntanglementEstablished { .. }
        )
    }
}

/// Routed classical data.
///
/// `hops` is append-only: the source records itself at creation and every
/// node that receives the packet records itself once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicDataPacket {
    pub id: Uuid,
    pub source: NodeId,
    pub destination: NodeId,
    pub payload: String,
    pub next_hop: Option<NodeId>,
    hops: Vec<NodeId>,
}

impl ClassicDataPacket {
    pub fn new(source: NodeId, destination: NodeId, payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            hops: vec![source.clone()],
            source,
            destination,
            payload: payload.into(),
            next_hop: None,
        }
    }

    /// Record that `node` handled the packet. Consecutive duplicates are ignored.
    pub fn append_hop(&mut self, node: &NodeId) {
        if self.hops.last() != Some(node) {
            self.hops.push(node.clone());
        }
    }

    pub fn hops(&self) -> &[NodeId] {
        &self.hops
    }

    /// True if some node appears twice in the hop trace.
    #[must_use]
    pub fn has_loop(&self) -> bool {
        self.hops
            .iter()
            .enumerate()
            .any(|(i, hop)| self.hops[i + 1..].contains(hop))
    }
}
