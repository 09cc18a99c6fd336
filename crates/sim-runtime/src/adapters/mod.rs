//! # Adapters
//!
//! Connections from node workers to shared infrastructure.

pub mod event_bus;
pub mod rng;

pub use event_bus::{error_type, NodeEvents};
pub use rng::{node_rng, node_seed};
