//! Outbound ports: what a repeater needs to know about its surroundings.

use qn_01_topology::Topology;
use shared_types::entities::{NodeId, NodeKind};

/// Read-only view of the quantum graph around a node.
pub trait QuantumNeighborhood {
    fn kind_of(&self, node: &NodeId) -> Option<NodeKind>;

    /// Nodes sharing a quantum channel with `node`, in channel order.
    fn quantum_neighbors(&self, node: &NodeId) -> Vec<NodeId>;
}

impl QuantumNeighborhood for Topology {
    fn kind_of(&self, node: &NodeId) -> Option<NodeKind> {
        Topology::kind_of(self, node)
    }

    fn quantum_neighbors(&self, node: &NodeId) -> Vec<NodeId> {
        Topology::quantum_neighbors(self, node)
    }
}
