//! Arena records: nodes, edges, networks and adapter bindings.
//!
//! Edges refer to nodes by [`NodeId`] only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shared_types::entities::{Location, NetworkKind, NodeId, NodeKind, ProtocolMode};

/// A node of the simulated world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub address: String,
    pub location: Location,
    pub kind: NodeKind,
    /// Owning network; adapters belong to a zone only.
    pub network: Option<String>,
    pub zone: String,
    pub protocol: ProtocolMode,
    /// Memory slots; only meaningful for repeaters.
    pub num_memories: usize,
}

/// Stable index of an edge in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Named noise channel applied to qubits in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoiseModel {
    #[default]
    None,
    Depolarizing,
    Dephasing,
    BitFlip,
    AmplitudeDamping,
}

impl FromStr for NoiseModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "none" | "ideal" => Ok(Self::None),
            "depolarizing" | "depolarising" => Ok(Self::Depolarizing),
            "dephasing" | "phase_flip" => Ok(Self::Dephasing),
            "bit_flip" | "bitflip" => Ok(Self::BitFlip),
            "amplitude_damping" => Ok(Self::AmplitudeDamping),
            other => Err(other.to_string()),
        }
    }
}

/// Parameters of a classical link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalLinkParams {
    pub bandwidth: u64,
    pub latency: u64,
    pub length: f64,
}

/// Parameters of a quantum link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumLinkParams {
    pub length: f64,
    pub loss_per_km: f64,
    pub noise_model: NoiseModel,
    pub noise_strength: f64,
    /// Qubits per protocol round.
    pub num_bits: usize,
    pub error_rate_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeKind {
    Classical(ClassicalLinkParams),
    Quantum(QuantumLinkParams),
}

/// An undirected link between exactly two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub name: String,
    pub endpoints: (NodeId, NodeId),
    pub kind: EdgeKind,
}

impl Edge {
    /// Order-insensitive endpoint match.
    #[must_use]
    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.endpoints.0 == a && &self.endpoints.1 == b)
            || (&self.endpoints.0 == b && &self.endpoints.1 == a)
    }

    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.endpoints.0 == node || &self.endpoints.1 == node
    }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    #[must_use]
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.endpoints.0 == node {
            Some(&self.endpoints.1)
        } else if &self.endpoints.1 == node {
            Some(&self.endpoints.0)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_quantum(&self) -> bool {
        matches!(self.kind, EdgeKind::Quantum(_))
    }

    #[must_use]
    pub fn quantum_params(&self) -> Option<&QuantumLinkParams> {
        match &self.kind {
            EdgeKind::Quantum(p) => Some(p),
            EdgeKind::Classical(_) => None,
        }
    }
}

/// A named network and the nodes it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub address: String,
    pub kind: NetworkKind,
    pub zone: String,
    pub location: Location,
    pub members: Vec<NodeId>,
}

/// An adapter and the two hosts it bridges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterBinding {
    pub adapter: NodeId,
    pub quantum_host: NodeId,
    pub classical_host: NodeId,
    pub classical_network: String,
    pub quantum_network: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str) -> Edge {
        Edge {
            id: EdgeId(0),
            name: "e".into(),
            endpoints: (a.into(), b.into()),
            kind: EdgeKind::Classical(ClassicalLinkParams {
                bandwidth: 1,
                latency: 0,
                length: 1.0,
            }),
        }
    }

    #[test]
    fn test_edge_is_symmetric() {
        let e = edge("a", "b");
        assert!(e.connects(&"a".into(), &"b".into()));
        assert!(e.connects(&"b".into(), &"a".into()));
        assert_eq!(e.other_end(&"b".into()), Some(&NodeId::from("a")));
        assert_eq!(e.other_end(&"c".into()), None);
        assert!(!e.is_quantum());
    }

    #[test]
    fn test_noise_model_names() {
        assert_eq!("none".parse::<NoiseModel>(), Ok(NoiseModel::None));
        assert_eq!("Bit-Flip".parse::<NoiseModel>(), Ok(NoiseModel::BitFlip));
        assert_eq!(
            "amplitude_damping".parse::<NoiseModel>(),
            Ok(NoiseModel::AmplitudeDamping)
        );
        assert!("thermal".parse::<NoiseModel>().is_err());
    }
}
