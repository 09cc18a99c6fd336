//! # Topology Description
//!
//! The serialized world handed to the simulator by external collaborators
//! (topology synthesis, persistence, web layer). Field names follow their
//! JSON records; this layer does no validation beyond what serde enforces.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Location, NetworkKind};

use crate::domain::errors::TopologyError;

pub const DEFAULT_NUM_BITS: usize = 100;
pub const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 0.11;
pub const DEFAULT_NOISE_MODEL: &str = "none";
pub const DEFAULT_NUM_MEMORIES: usize = 2;

/// Root of a simulation world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyDescription {
    pub name: String,
    #[serde(default)]
    pub size: Option<(f64, f64)>,
    pub zones: Vec<ZoneDescription>,
}

impl TopologyDescription {
    pub fn from_json(json: &str) -> Result<Self, TopologyError> {
        serde_json::from_str(json).map_err(|e| TopologyError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, TopologyError> {
        serde_json::to_string_pretty(self).map_err(|e| TopologyError::Parse(e.to_string()))
    }

    /// Iterate over every network of every zone, with its zone name.
    pub fn networks(&self) -> impl Iterator<Item = (&str, &NetworkDescription)> {
        self.zones
            .iter()
            .flat_map(|z| z.networks.iter().map(move |n| (z.name.as_str(), n)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDescription {
    pub name: String,
    #[serde(rename = "type", default = "default_zone_kind")]
    pub kind: String,
    #[serde(default)]
    pub size: Option<(f64, f64)>,
    #[serde(default)]
    pub position: Option<(f64, f64)>,
    #[serde(default)]
    pub networks: Vec<NetworkDescription>,
    #[serde(default)]
    pub adapters: Vec<AdapterDescription>,
}

fn default_zone_kind() -> String {
    "SECURE".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescription {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "type")]
    pub kind: NetworkKind,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub hosts: Vec<NodeDescription>,
    #[serde(default)]
    pub connections: Vec<ConnectionDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    /// Type tag, e.g. `QuantumHost` or `quantum_repeater`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub location: Location,
    /// `bb84` or `entanglement_swapping` for quantum nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Repeater memory slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_memories: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub from_node: String,
    pub to_node: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_length")]
    pub length: f64,
    #[serde(default)]
    pub loss_per_km: f64,
    #[serde(default = "default_noise_model")]
    pub noise_model: String,
    #[serde(default)]
    pub noise_strength: f64,
    #[serde(default = "default_bandwidth")]
    pub bandwidth: u64,
    #[serde(default)]
    pub latency: u64,
    #[serde(default = "default_num_bits")]
    pub num_bits: usize,
    #[serde(default = "default_threshold")]
    pub error_rate_threshold: f64,
}

impl ConnectionDescription {
    /// A classical link with default parameters.
    pub fn classical(from: &str, to: &str) -> Self {
        Self {
            from_node: from.to_string(),
            to_node: to.to_string(),
            name: format!("{from} <-> {to}"),
            length: default_length(),
            loss_per_km: 0.0,
            noise_model: default_noise_model(),
            noise_strength: 0.0,
            bandwidth: default_bandwidth(),
            latency: 0,
            num_bits: default_num_bits(),
            error_rate_threshold: default_threshold(),
        }
    }

    /// A noiseless, lossless quantum link carrying `num_bits` qubits per round.
    pub fn quantum(from: &str, to: &str, num_bits: usize) -> Self {
        Self {
            num_bits,
            ..Self::classical(from, to)
        }
    }
}

fn default_length() -> f64 {
    1.0
}

fn default_noise_model() -> String {
    DEFAULT_NOISE_MODEL.to_string()
}

fn default_bandwidth() -> u64 {
    1000
}

fn default_num_bits() -> usize {
    DEFAULT_NUM_BITS
}

fn default_threshold() -> f64 {
    DEFAULT_ERROR_RATE_THRESHOLD
}

/// Bridges a classical network to a quantum network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterDescription {
    pub name: String,
    #[serde(rename = "type", default = "default_adapter_kind")]
    pub kind: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub location: Location,
    pub quantum_host: String,
    pub classical_host: String,
    pub classical_network: String,
    pub quantum_network: String,
}

fn default_adapter_kind() -> String {
    "QuantumAdapter".to_string()
}
