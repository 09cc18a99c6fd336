//! # Shared Types Crate
//!
//! This crate contains the identities, kind tags, classical control messages
//! and the error taxonomy shared by every crate of the simulator.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Ids, not references**: Nodes, channels and connections refer to each
//!   other through [`NodeId`] only, so the topology never forms ownership
//!   cycles.
//! - **Closed kind tags**: Dispatch on node behaviour goes through
//!   [`NodeKind`], never through capability probing.

pub mod entities;
pub mod errors;
pub mod messages;

pub use entities::*;
pub use errors::*;
pub use messages::*;
