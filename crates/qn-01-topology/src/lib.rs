//! # Topology Subsystem
//!
//! **Subsystem ID:** qn-01
//!
//! Turns a serialized world (zones, networks, hosts, connections, adapters)
//! into a validated, immutable arena of nodes and edges that every other
//! subsystem queries.
//!
//! ## Layout
//!
//! ```text
//! TopologyDescription (JSON)
//!         │
//!         ▼
//! ┌───────────────────┐     ┌──────────────┐
//! │ Topology::build   │────►│ validation   │  kinds, protocols, link params
//! └───────────────────┘     └──────────────┘
//!         │
//!         ▼
//!   nodes ─ edges ─ networks ─ adapter bindings   (read-only, shared)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use qn_01_topology::{Topology, TopologyBuilder};
//! use shared_types::NodeId;
//!
//! let desc = TopologyBuilder::new("pair")
//!     .quantum_network("qnet", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
//!     .quantum_link("qnet", "alice", "bob", 32)
//!     .build();
//! let topo = Topology::build(&desc).unwrap();
//! assert_eq!(topo.quantum_neighbors(&NodeId::from("alice")), vec![NodeId::from("bob")]);
//! ```

pub mod builder;
pub mod description;
pub mod domain;

pub use builder::TopologyBuilder;
pub use description::{
    AdapterDescription, ConnectionDescription, NetworkDescription, NodeDescription,
    TopologyDescription, ZoneDescription,
};
pub use domain::{
    AdapterBinding, ClassicalLinkParams, Edge, EdgeId, EdgeKind, Network, Node, NoiseModel,
    QuantumLinkParams, Topology, TopologyError,
};
