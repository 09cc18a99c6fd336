//! Topology error types.

use shared_types::errors::SimulationError;
use thiserror::Error;

/// Reasons a topology description is rejected.
///
/// Every variant is fatal to the run: no worker is started for a topology
/// that fails to build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("cannot parse topology: {0}")]
    Parse(String),

    #[error("unknown node type '{tag}' on node '{node}'")]
    UnknownNodeType { node: String, tag: String },

    #[error("unknown protocol '{protocol}' on node '{node}'")]
    UnknownProtocol { node: String, protocol: String },

    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),

    #[error("duplicate network name '{0}'")]
    DuplicateNetwork(String),

    #[error("node '{node}' of kind {kind} cannot live in {network_kind:?} network '{network}'")]
    NodeKindMismatch {
        node: String,
        kind: String,
        network: String,
        network_kind: shared_types::entities::NetworkKind,
    },

    #[error("connection '{connection}' references unknown node '{node}'")]
    DanglingEndpoint { connection: String, node: String },

    #[error("connection '{0}' connects a node to itself")]
    SelfLoop(String),

    #[error("connection '{connection}' mixes classical and quantum endpoints")]
    MixedEndpoints { connection: String },

    #[error("quantum connection '{connection}': {reason}")]
    InvalidQuantumParameters { connection: String, reason: String },

    #[error("unknown noise model '{model}' on connection '{connection}'")]
    UnknownNoiseModel { connection: String, model: String },

    #[error("adapter '{adapter}' references unknown {what} '{name}'")]
    AdapterReference {
        adapter: String,
        what: &'static str,
        name: String,
    },
}

impl From<TopologyError> for SimulationError {
    fn from(err: TopologyError) -> Self {
        SimulationError::MalformedTopology(err.to_string())
    }
}
