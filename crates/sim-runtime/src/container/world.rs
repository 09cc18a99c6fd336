//! # World
//!
//! Everything built once from the topology and never mutated afterwards:
//! the node arena, quantum channels, classical connections and the single
//! route table instance.

use std::collections::HashSet;
use std::sync::Arc;

use qn_01_topology::{Topology, TopologyDescription, TopologyError};
use qn_03_channels::{ClassicalConnection, QuantumChannel};
use qn_06_routing::RouteTable;
use shared_types::entities::{NodeId, NodeKind, ProtocolMode};
use tracing::info;

#[derive(Debug)]
pub struct World {
    topology: Topology,
    quantum_channels: Vec<QuantumChannel>,
    connections: Vec<ClassicalConnection>,
    routes: Arc<RouteTable>,
}

impl World {
    /// Validate `desc` and derive channels and routes from it.
    pub fn build(desc: &TopologyDescription) -> Result<Self, TopologyError> {
        let topology = Topology::build(desc)?;
        let quantum_channels: Vec<_> = topology
            .edges()
            .iter()
            .filter_map(QuantumChannel::from_edge)
            .collect();
        let connections: Vec<_> = topology
            .edges()
            .iter()
            .filter_map(ClassicalConnection::from_edge)
            .collect();
        let routes = Arc::new(RouteTable::from_topology(&topology));

        info!(
            topology = topology.name(),
            quantum_channels = quantum_channels.len(),
            connections = connections.len(),
            "World assembled"
        );
        Ok(Self {
            topology,
            quantum_channels,
            connections,
            routes,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn routes(&self) -> Arc<RouteTable> {
        Arc::clone(&self.routes)
    }

    pub fn kind_of(&self, node: &NodeId) -> Option<NodeKind> {
        self.topology.kind_of(node)
    }

    /// Resolve a user-supplied name to a node of the topology.
    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        let id = NodeId::from(name);
        self.topology.contains(&id).then_some(id)
    }

    pub fn quantum_channels(&self) -> &[QuantumChannel] {
        &self.quantum_channels
    }

    pub fn quantum_channels_of(&self, node: &NodeId) -> Vec<QuantumChannel> {
        self.quantum_channels
            .iter()
            .filter(|c| c.other_end(node).is_some())
            .cloned()
            .collect()
    }

    pub fn connections_of(&self, node: &NodeId) -> Vec<ClassicalConnection> {
        self.connections
            .iter()
            .filter(|c| c.other_end(node).is_some())
            .cloned()
            .collect()
    }

    /// A BB84 host wired to exactly two quantum channels relays between them.
    pub fn is_relay(&self, node: &NodeId) -> bool {
        self.topology.node(node).is_some_and(|n| {
            n.kind == NodeKind::QuantumHost
                && n.protocol == ProtocolMode::Bb84
                && self.topology.quantum_neighbors(node).len() == 2
        })
    }

    /// The key-agreement peer of `host` reached through `neighbor`.
    ///
    /// Intercept-resend relays are transparent: the walk continues through
    /// them to the host on the far side.
    pub fn key_peer(&self, host: &NodeId, neighbor: &NodeId) -> NodeId {
        let mut previous = host.clone();
        let mut current = neighbor.clone();
        let mut visited = HashSet::from([host.clone()]);

        while self.is_relay(&current) && visited.insert(current.clone()) {
            let next = self
                .topology
                .quantum_neighbors(&current)
                .into_iter()
                .find(|n| *n != previous);
            match next {
                Some(next) => {
                    previous = std::mem::replace(&mut current, next);
                }
                None => break,
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qn_01_topology::TopologyBuilder;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn relayed() -> World {
        let desc = TopologyBuilder::new("relay")
            .quantum_network(
                "q",
                &[("alice", "QuantumHost"), ("eve", "QuantumHost"), ("bob", "QuantumHost")],
            )
            .quantum_link("q", "alice", "eve", 16)
            .quantum_link("q", "eve", "bob", 16)
            .build();
        World::build(&desc).unwrap()
    }

    #[test]
    fn test_relay_is_transparent_for_peers() {
        let world = relayed();
        assert!(world.is_relay(&id("eve")));
        assert!(!world.is_relay(&id("alice")));
        assert_eq!(world.key_peer(&id("alice"), &id("eve")), id("bob"));
        assert_eq!(world.key_peer(&id("bob"), &id("eve")), id("alice"));
    }

    #[test]
    fn test_channels_and_connections_split_by_kind() {
        let desc = TopologyBuilder::new("split")
            .classical_network("net", &[("h1", "ClassicalHost"), ("h2", "ClassicalHost")])
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .link("net", "h1", "h2")
            .quantum_link("q", "alice", "bob", 8)
            .build();
        let world = World::build(&desc).unwrap();
        assert_eq!(world.quantum_channels_of(&id("alice")).len(), 1);
        assert!(world.quantum_channels_of(&id("h1")).is_empty());
        assert_eq!(world.connections_of(&id("h2")).len(), 1);
        assert_eq!(world.routes().edge_count(), 1);
        assert_eq!(world.resolve("bob"), Some(id("bob")));
        assert_eq!(world.resolve("carol"), None);
    }
}
