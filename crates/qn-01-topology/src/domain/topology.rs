//! # Topology Arena
//!
//! Validated, immutable node/edge arena built from a [`TopologyDescription`].
//! Built once at simulation start and shared read-only by every worker.

use std::collections::HashMap;

use shared_types::entities::{NetworkKind, NodeId, NodeKind, ProtocolMode};
use tracing::{debug, info};

use super::entities::{
    AdapterBinding, ClassicalLinkParams, Edge, EdgeId, EdgeKind, Network, Node,
};
use super::errors::TopologyError;
use super::validation;
use crate::description::{TopologyDescription, DEFAULT_NUM_MEMORIES};

#[derive(Debug, Clone)]
pub struct Topology {
    name: String,
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    /// Edge ids per node, in insertion order.
    adjacency: HashMap<NodeId, Vec<EdgeId>>,
    networks: Vec<Network>,
    adapters: Vec<AdapterBinding>,
}

impl Topology {
    /// Validate `desc` and build the arena.
    ///
    /// Nothing is produced unless every node, connection and adapter is valid.
    pub fn build(desc: &TopologyDescription) -> Result<Self, TopologyError> {
        let mut topo = Self {
            name: desc.name.clone(),
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            adjacency: HashMap::new(),
            networks: Vec::new(),
            adapters: Vec::new(),
        };

        // Pass 1: every node, so connections may reference across networks.
        for (zone, net) in desc.networks() {
            if topo.networks.iter().any(|n| n.name == net.name) {
                return Err(TopologyError::DuplicateNetwork(net.name.clone()));
            }

            let mut members = Vec::with_capacity(net.hosts.len());
            for host in &net.hosts {
                let kind = validation::node_kind(host)?;
                if !net.kind.admits(kind) {
                    return Err(TopologyError::NodeKindMismatch {
                        node: host.name.clone(),
                        kind: kind.to_string(),
                        network: net.name.clone(),
                        network_kind: net.kind,
                    });
                }
                let protocol = validation::protocol(host, kind)?;
                let node = Node {
                    id: NodeId::from(host.name.as_str()),
                    address: host.address.clone(),
                    location: host.location,
                    kind,
                    network: Some(net.name.clone()),
                    zone: zone.to_string(),
                    protocol,
                    num_memories: host.num_memories.unwrap_or(DEFAULT_NUM_MEMORIES),
                };
                members.push(node.id.clone());
                topo.insert_node(node)?;
            }

            topo.networks.push(Network {
                name: net.name.clone(),
                address: net.address.clone(),
                kind: net.kind,
                zone: zone.to_string(),
                location: net.location,
                members,
            });
        }

        for zone in &desc.zones {
            for adapter in &zone.adapters {
                match adapter.kind.parse::<NodeKind>() {
                    Ok(NodeKind::Adapter) => {}
                    _ => {
                        return Err(TopologyError::UnknownNodeType {
                            node: adapter.name.clone(),
                            tag: adapter.kind.clone(),
                        })
                    }
                }
                topo.insert_node(Node {
                    id: NodeId::from(adapter.name.as_str()),
                    address: adapter.address.clone(),
                    location: adapter.location,
                    kind: NodeKind::Adapter,
                    network: None,
                    zone: zone.name.clone(),
                    protocol: ProtocolMode::default(),
                    num_memories: 0,
                })?;
            }
        }

        // Pass 2: connections.
        for (_, net) in desc.networks() {
            for conn in &net.connections {
                let name = if conn.name.is_empty() {
                    format!("{} <-> {}", conn.from_node, conn.to_node)
                } else {
                    conn.name.clone()
                };
                let from = topo.require_endpoint(&name, &conn.from_node)?;
                let to = topo.require_endpoint(&name, &conn.to_node)?;
                if from == to {
                    return Err(TopologyError::SelfLoop(name));
                }

                let kind = match net.kind {
                    NetworkKind::Quantum => {
                        topo.require_kinds(&name, &from, &to, NodeKind::is_quantum)?;
                        EdgeKind::Quantum(validation::quantum_params(&name, conn)?)
                    }
                    NetworkKind::Classical => {
                        topo.require_kinds(&name, &from, &to, NodeKind::is_classical)?;
                        EdgeKind::Classical(ClassicalLinkParams {
                            bandwidth: conn.bandwidth,
                            latency: conn.latency,
                            length: conn.length,
                        })
                    }
                };
                topo.insert_edge(name, from, to, kind);
            }
        }

        // Pass 3: adapters bridge a classical host and a quantum host.
        for zone in &desc.zones {
            for adapter in &zone.adapters {
                let reference = |what: &'static str, name: &str| TopologyError::AdapterReference {
                    adapter: adapter.name.clone(),
                    what,
                    name: name.to_string(),
                };

                for network in [&adapter.classical_network, &adapter.quantum_network] {
                    if !topo.networks.iter().any(|n| &n.name == network) {
                        return Err(reference("network", network));
                    }
                }

                let quantum_host = NodeId::from(adapter.quantum_host.as_str());
                if topo.kind_of(&quantum_host) != Some(NodeKind::QuantumHost) {
                    return Err(reference("quantum host", &adapter.quantum_host));
                }
                let classical_host = NodeId::from(adapter.classical_host.as_str());
                if !topo.kind_of(&classical_host).is_some_and(NodeKind::is_classical) {
                    return Err(reference("classical host", &adapter.classical_host));
                }

                let adapter_id = NodeId::from(adapter.name.as_str());
                topo.insert_edge(
                    format!("{} <-> {}", adapter.name, adapter.classical_host),
                    adapter_id.clone(),
                    classical_host.clone(),
                    EdgeKind::Classical(ClassicalLinkParams {
                        bandwidth: 1000,
                        latency: 0,
                        length: 0.0,
                    }),
                );
                topo.adapters.push(AdapterBinding {
                    adapter: adapter_id,
                    quantum_host,
                    classical_host,
                    classical_network: adapter.classical_network.clone(),
                    quantum_network: adapter.quantum_network.clone(),
                });
            }
        }

        info!(
            topology = %topo.name,
            nodes = topo.nodes.len(),
            edges = topo.edges.len(),
            adapters = topo.adapters.len(),
            "[qn-01] Topology built"
        );
        Ok(topo)
    }

    fn insert_node(&mut self, node: Node) -> Result<(), TopologyError> {
        if self.index.contains_key(&node.id) {
            return Err(TopologyError::DuplicateNode(node.id.to_string()));
        }
        debug!(node = %node.id, kind = %node.kind, "[qn-01] Node added");
        self.index.insert(node.id.clone(), self.nodes.len());
        self.adjacency.entry(node.id.clone()).or_default();
        self.nodes.push(node);
        Ok(())
    }

    fn insert_edge(&mut self, name: String, a: NodeId, b: NodeId, kind: EdgeKind) {
        let id = EdgeId(self.edges.len());
        self.adjacency.entry(a.clone()).or_default().push(id);
        self.adjacency.entry(b.clone()).or_default().push(id);
        debug!(edge = %id, name = %name, from = %a, to = %b, "[qn-01] Edge added");
        self.edges.push(Edge {
            id,
            name,
            endpoints: (a, b),
            kind,
        });
    }

    fn require_endpoint(&self, connection: &str, node: &str) -> Result<NodeId, TopologyError> {
        let id = NodeId::from(node);
        if self.index.contains_key(&id) {
            Ok(id)
        } else {
            Err(TopologyError::DanglingEndpoint {
                connection: connection.to_string(),
                node: node.to_string(),
            })
        }
    }

    fn require_kinds(
        &self,
        connection: &str,
        a: &NodeId,
        b: &NodeId,
        allowed: fn(NodeKind) -> bool,
    ) -> Result<(), TopologyError> {
        let ok = [a, b]
            .iter()
            .all(|id| self.kind_of(id).is_some_and(allowed));
        if ok {
            Ok(())
        } else {
            Err(TopologyError::MixedEndpoints {
                connection: connection.to_string(),
            })
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn kind_of(&self, id: &NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn adapters(&self) -> &[AdapterBinding] {
        &self.adapters
    }

    /// Edges touching `node`, in insertion order.
    pub fn edges_of<'a>(&'a self, node: &NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.adjacency
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id.0))
    }

    /// First edge of any kind between `a` and `b`, in either order.
    pub fn edge_between(&self, a: &NodeId, b: &NodeId) -> Option<&Edge> {
        self.edges_of(a).find(|e| e.connects(a, b))
    }

    pub fn classical_edge_between(&self, a: &NodeId, b: &NodeId) -> Option<&Edge> {
        self.edges_of(a).find(|e| !e.is_quantum() && e.connects(a, b))
    }

    pub fn quantum_edge_between(&self, a: &NodeId, b: &NodeId) -> Option<&Edge> {
        self.edges_of(a).find(|e| e.is_quantum() && e.connects(a, b))
    }

    pub fn classical_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| !e.is_quantum())
    }

    pub fn quantum_edges_of<'a>(&'a self, node: &NodeId) -> Vec<&'a Edge> {
        self.edges_of(node).filter(|e| e.is_quantum()).collect()
    }

    pub fn classical_neighbors(&self, node: &NodeId) -> Vec<NodeId> {
        self.edges_of(node)
            .filter(|e| !e.is_quantum())
            .filter_map(|e| e.other_end(node).cloned())
            .collect()
    }

    pub fn quantum_neighbors(&self, node: &NodeId) -> Vec<NodeId> {
        self.edges_of(node)
            .filter(|e| e.is_quantum())
            .filter_map(|e| e.other_end(node).cloned())
            .collect()
    }

    /// The adapter bound to `quantum_host`, if any.
    pub fn adapter_for_quantum_host(&self, quantum_host: &NodeId) -> Option<&AdapterBinding> {
        self.adapters.iter().find(|a| &a.quantum_host == quantum_host)
    }

    pub fn adapter(&self, adapter: &NodeId) -> Option<&AdapterBinding> {
        self.adapters.iter().find(|a| &a.adapter == adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TopologyBuilder;
    use crate::description::ConnectionDescription;

    fn hybrid() -> TopologyDescription {
        TopologyBuilder::new("hybrid")
            .classical_network("cnet", &[
                ("h1", "ClassicalHost"),
                ("r1", "ClassicalRouter"),
                ("ix", "InternetExchange"),
                ("h2", "ClassicalHost"),
            ])
            .link("cnet", "h1", "r1")
            .link("cnet", "r1", "ix")
            .link("cnet", "ix", "h2")
            .quantum_network("qnet", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .quantum_link("qnet", "alice", "bob", 32)
            .adapter("adp-a", "alice", "h1", "cnet", "qnet")
            .adapter("adp-b", "bob", "h2", "cnet", "qnet")
            .build()
    }

    #[test]
    fn test_build_hybrid_world() {
        let topo = Topology::build(&hybrid()).unwrap();
        assert_eq!(topo.nodes().count(), 8);
        assert_eq!(topo.networks().len(), 2);
        // 3 classical links, 1 quantum, 2 adapter links
        assert_eq!(topo.edges().len(), 6);

        let alice = NodeId::from("alice");
        let bob = NodeId::from("bob");
        assert_eq!(topo.quantum_neighbors(&alice), vec![bob.clone()]);
        assert!(topo.quantum_edge_between(&bob, &alice).is_some());
        assert!(topo.classical_edge_between(&alice, &bob).is_none());

        let binding = topo.adapter_for_quantum_host(&alice).unwrap();
        assert_eq!(binding.adapter, NodeId::from("adp-a"));
        assert!(topo
            .classical_edge_between(&NodeId::from("h1"), &NodeId::from("adp-a"))
            .is_some());
        assert_eq!(topo.node(&NodeId::from("adp-a")).unwrap().network, None);
    }

    #[test]
    fn test_classical_neighbors_in_insertion_order() {
        let topo = Topology::build(&hybrid()).unwrap();
        assert_eq!(
            topo.classical_neighbors(&NodeId::from("r1")),
            vec![NodeId::from("h1"), NodeId::from("ix")]
        );
    }

    #[test]
    fn test_rejects_unknown_type_tag() {
        let desc = TopologyBuilder::new("bad")
            .classical_network("cnet", &[("h1", "Mainframe")])
            .build();
        assert!(matches!(
            Topology::build(&desc),
            Err(TopologyError::UnknownNodeType { .. })
        ));
    }

    #[test]
    fn test_rejects_dangling_endpoint() {
        let desc = TopologyBuilder::new("bad")
            .classical_network("cnet", &[("h1", "ClassicalHost")])
            .link("cnet", "h1", "ghost")
            .build();
        let err = Topology::build(&desc).unwrap_err();
        assert_eq!(
            err,
            TopologyError::DanglingEndpoint {
                connection: "h1 <-> ghost".into(),
                node: "ghost".into()
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_and_self_loop() {
        let dup = TopologyBuilder::new("dup")
            .classical_network("a", &[("h1", "ClassicalHost")])
            .classical_network("b", &[("h1", "ClassicalRouter")])
            .build();
        assert_eq!(
            Topology::build(&dup).unwrap_err(),
            TopologyError::DuplicateNode("h1".into())
        );

        let looped = TopologyBuilder::new("loop")
            .classical_network("a", &[("h1", "ClassicalHost")])
            .link("a", "h1", "h1")
            .build();
        assert!(matches!(
            Topology::build(&looped),
            Err(TopologyError::SelfLoop(_))
        ));
    }

    #[test]
    fn test_rejects_quantum_node_in_classical_network() {
        let desc = TopologyBuilder::new("bad")
            .classical_network("cnet", &[("alice", "QuantumHost")])
            .build();
        assert!(matches!(
            Topology::build(&desc),
            Err(TopologyError::NodeKindMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_quantum_link_to_classical_node() {
        let mut desc = TopologyBuilder::new("bad")
            .classical_network("cnet", &[("h1", "ClassicalHost")])
            .quantum_network("qnet", &[("alice", "QuantumHost")])
            .build();
        desc.zones[0].networks[1]
            .connections
            .push(ConnectionDescription::quantum("alice", "h1", 8));
        assert!(matches!(
            Topology::build(&desc),
            Err(TopologyError::MixedEndpoints { .. })
        ));
    }

    #[test]
    fn test_rejects_adapter_with_unknown_network() {
        let desc = TopologyBuilder::new("bad")
            .classical_network("cnet", &[("h1", "ClassicalHost")])
            .quantum_network("qnet", &[("alice", "QuantumHost")])
            .adapter("adp", "alice", "h1", "cnet", "elsewhere")
            .build();
        assert!(matches!(
            Topology::build(&desc),
            Err(TopologyError::AdapterReference { what: "network", .. })
        ));
    }

    #[test]
    fn test_repeater_memory_defaults() {
        let desc = TopologyBuilder::new("chain")
            .quantum_network("qnet", &[
                ("alice", "QuantumHost"),
                ("rep", "QuantumRepeater"),
                ("bob", "QuantumHost"),
            ])
            .build();
        let topo = Topology::build(&desc).unwrap();
        let rep = topo.node(&NodeId::from("rep")).unwrap();
        assert_eq!(rep.num_memories, DEFAULT_NUM_MEMORIES);
        assert_eq!(rep.protocol, ProtocolMode::EntanglementSwapping);
    }
}
