//! # Core Domain Entities
//!
//! Defines the identities and tags every simulator crate agrees on.
//!
//! ## Clusters
//!
//! - **Identity**: `NodeId`, `Location`
//! - **Kinds**: `NodeKind`, `NetworkKind`, `ProtocolMode`
//! - **Quantum primitives**: `Basis`, `Bit`, `BellOutcome`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SimulationError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Unique identifier for a node in the simulated world.
///
/// The topology uses node names as identifiers; addresses are carried
/// separately on the node record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Planar position of a node, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Location(pub f64, pub f64);

// =============================================================================
// CLUSTER B: KIND TAGS
// =============================================================================

/// Closed set of node behaviours.
///
/// Every behavioural branch in the simulator matches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    ClassicalHost,
    ClassicalRouter,
    InternetExchange,
    QuantumHost,
    QuantumRepeater,
    Adapter,
}

impl NodeKind {
    /// Nodes that live on the quantum side of an adapter.
    #[must_use]
    pub fn is_quantum(self) -> bool {
        matches!(self, Self::QuantumHost | Self::QuantumRepeater)
    }

    /// Nodes that take part in classical packet forwarding.
    #[must_use]
    pub fn is_classical(self) -> bool {
        !self.is_quantum()
    }

    /// A quantum end host, i.e. a possible endpoint of key agreement.
    #[must_use]
    pub fn is_end_host(self) -> bool {
        matches!(self, Self::QuantumHost)
    }

    /// The canonical type tag used in topology descriptions.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::ClassicalHost => "ClassicalHost",
            Self::ClassicalRouter => "ClassicalRouter",
            Self::InternetExchange => "InternetExchange",
            Self::QuantumHost => "QuantumHost",
            Self::QuantumRepeater => "QuantumRepeater",
            Self::Adapter => "Adapter",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for NodeKind {
    type Err = SimulationError;

    /// Accepts `ClassicalHost`, `classical_host` and `CLASSICAL_HOST` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "classicalhost" => Ok(Self::ClassicalHost),
            "classicalrouter" => Ok(Self::ClassicalRouter),
            "internetexchange" => Ok(Self::InternetExchange),
            "quantumhost" => Ok(Self::QuantumHost),
            "quantumrepeater" => Ok(Self::QuantumRepeater),
            "adapter" | "quantumadapter" => Ok(Self::Adapter),
            _ => Err(SimulationError::MalformedTopology(format!(
                "unknown node type tag '{s}'"
            ))),
        }
    }
}

/// Kind of a network; a network holds nodes of one kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkKind {
    #[serde(rename = "CLASSICAL_NETWORK")]
    Classical,
    #[serde(rename = "QUANTUM_NETWORK")]
    Quantum,
}

impl NetworkKind {
    /// Whether a node of `kind` may be a member of a network of this kind.
    #[must_use]
    pub fn admits(self, kind: NodeKind) -> bool {
        match self {
            Self::Classical => kind.is_classical(),
            Self::Quantum => kind.is_quantum(),
        }
    }
}

/// Protocol variant a quantum node is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolMode {
    #[default]
    Bb84,
    EntanglementSwapping,
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bb84 => f.write_str("bb84"),
            Self::EntanglementSwapping => f.write_str("entanglement_swapping"),
        }
    }
}

impl FromStr for ProtocolMode {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bb84" => Ok(Self::Bb84),
            "entanglement_swapping" | "entanglement-swapping" => Ok(Self::EntanglementSwapping),
            other => Err(SimulationError::MalformedTopology(format!(
                "unknown protocol '{other}'"
            ))),
        }
    }
}

// =============================================================================
// CLUSTER C: QUANTUM PRIMITIVES
// =============================================================================

/// A classical bit value (0 or 1).
pub type Bit = u8;

/// Measurement / preparation basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Computational basis {|0>, |1>} ("Z").
    #[serde(rename = "Z")]
    Rectilinear,
    /// Hadamard basis {|+>, |->} ("X").
    #[serde(rename = "X")]
    Diagonal,
}

impl Basis {
    pub const ALL: [Basis; 2] = [Basis::Rectilinear, Basis::Diagonal];

    /// Maps a fair coin flip onto a basis.
    #[must_use]
    pub fn from_coin(heads: bool) -> Self {
        if heads {
            Self::Diagonal
        } else {
            Self::Rectilinear
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rectilinear => f.write_str("Z"),
            Self::Diagonal => f.write_str("X"),
        }
    }
}

/// Two-bit result of a Bell-state measurement.
///
/// Index order of the Bell basis: Φ+ → (0,0), Ψ+ → (0,1), Φ− → (1,0), Ψ− → (1,1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BellOutcome(pub Bit, pub Bit);

impl BellOutcome {
    /// Build from the Bell basis index (0..4).
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(((index / 2) % 2) as Bit, (index % 2) as Bit)
    }

    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0) * 2 + usize::from(self.1)
    }
}

impl fmt::Display for BellOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}
