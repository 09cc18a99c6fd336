//! Items handed to a node's inbox.

use std::fmt;

use qn_01_topology::EdgeId;
use qn_02_quantum_state::Qubit;
use serde::{Deserialize, Serialize};
use shared_types::entities::NodeId;
use shared_types::messages::{ClassicDataPacket, ControlMessage};

/// Which channel a qubit arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    /// A physical quantum link from the topology.
    Edge(EdgeId),
    /// A logical link created by entanglement swapping.
    Logical(NodeId, NodeId),
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edge(id) => write!(f, "{id}"),
            Self::Logical(a, b) => write!(f, "ent({a}, {b})"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Inbound {
    Qubit {
        qubit: Qubit,
        from: NodeId,
        channel: ChannelId,
    },
    Packet {
        packet: ClassicDataPacket,
        from: NodeId,
    },
    Control {
        message: ControlMessage,
        from: NodeId,
    },
}

impl Inbound {
    pub fn from(&self) -> &NodeId {
        match self {
            Self::Qubit { from, .. } | Self::Packet { from, .. } | Self::Control { from, .. } => {
                from
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Qubit { .. } => "qubit",
            Self::Packet { .. } => "packet",
            Self::Control { .. } => "control",
        }
    }
}
