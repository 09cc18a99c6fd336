//! Programmatic construction of [`TopologyDescription`]s.
//!
//! Everything lands in a single zone. Adapters are placed in that zone.

use shared_types::entities::{Location, NetworkKind};

use crate::description::{
    AdapterDescription, ConnectionDescription, NetworkDescription, NodeDescription,
    TopologyDescription, ZoneDescription,
};

#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    desc: TopologyDescription,
}

impl TopologyBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            desc: TopologyDescription {
                name: name.to_string(),
                size: None,
                zones: vec![ZoneDescription {
                    name: format!("{name}-zone"),
                    kind: "SECURE".to_string(),
                    size: None,
                    position: None,
                    networks: Vec::new(),
                    adapters: Vec::new(),
                }],
            },
        }
    }

    pub fn classical_network(self, name: &str, hosts: &[(&str, &str)]) -> Self {
        self.network(name, NetworkKind::Classical, hosts)
    }

    pub fn quantum_network(self, name: &str, hosts: &[(&str, &str)]) -> Self {
        self.network(name, NetworkKind::Quantum, hosts)
    }

    fn network(mut self, name: &str, kind: NetworkKind, hosts: &[(&str, &str)]) -> Self {
        let hosts = hosts
            .iter()
            .enumerate()
            .map(|(i, (host, tag))| NodeDescription {
                name: host.to_string(),
                kind: tag.to_string(),
                address: format!("{name}.{i}"),
                location: Location(i as f64, 0.0),
                protocol: None,
                num_memories: None,
            })
            .collect();
        self.zone().networks.push(NetworkDescription {
            name: name.to_string(),
            address: name.to_string(),
            kind,
            location: Location::default(),
            hosts,
            connections: Vec::new(),
        });
        self
    }

    /// Set the protocol tag of an already declared host.
    pub fn protocol(mut self, host: &str, protocol: &str) -> Self {
        if let Some(node) = self.host_mut(host) {
            node.protocol = Some(protocol.to_string());
        }
        self
    }

    pub fn memories(mut self, host: &str, num_memories: usize) -> Self {
        if let Some(node) = self.host_mut(host) {
            node.num_memories = Some(num_memories);
        }
        self
    }

    /// Classical link inside `network`.
    pub fn link(self, network: &str, from: &str, to: &str) -> Self {
        self.connection(network, ConnectionDescription::classical(from, to))
    }

    /// Ideal quantum link inside `network`.
    pub fn quantum_link(self, network: &str, from: &str, to: &str, num_bits: usize) -> Self {
        self.connection(network, ConnectionDescription::quantum(from, to, num_bits))
    }

    /// Arbitrary connection inside `network`.
    pub fn connection(mut self, network: &str, conn: ConnectionDescription) -> Self {
        if let Some(net) = self.zone().networks.iter_mut().find(|n| n.name == network) {
            net.connections.push(conn);
        }
        self
    }

    pub fn adapter(
        mut self,
        name: &str,
        quantum_host: &str,
        classical_host: &str,
        classical_network: &str,
        quantum_network: &str,
    ) -> Self {
        self.zone().adapters.push(AdapterDescription {
            name: name.to_string(),
            kind: "QuantumAdapter".to_string(),
            address: name.to_string(),
            location: Location::default(),
            quantum_host: quantum_host.to_string(),
            classical_host: classical_host.to_string(),
            classical_network: classical_network.to_string(),
            quantum_network: quantum_network.to_string(),
        });
        self
    }

    pub fn build(self) -> TopologyDescription {
        self.desc
    }

    fn zone(&mut self) -> &mut ZoneDescription {
        // `new` always creates the zone.
        &mut self.desc.zones[0]
    }

    fn host_mut(&mut self, host: &str) -> Option<&mut NodeDescription> {
        self.zone()
            .networks
            .iter_mut()
            .flat_map(|n| n.hosts.iter_mut())
            .find(|h| h.name == host)
    }
}
