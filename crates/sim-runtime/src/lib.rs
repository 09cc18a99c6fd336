//! # Quantum-Net Simulation Runtime
//!
//! Loads a topology and runs one independent worker per node. Workers share
//! nothing mutable except their inboxes and the completed-key store.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and the read-only world
//! - `adapters/` - Event bus handle and per-node random generators
//! - `handlers/` - Node behaviours and the worker loop
//! - `wiring/` - Bounded per-node inboxes
//!
//! ## Data Flow
//!
//! ```text
//!   Simulator ──command──► inbox ──► worker ──► handler
//!                            ▲                    │
//!                            │   channel/control  │
//!                            └────────────────────┤
//!                                                 ▼
//!                                           event bus ──► collaborators
//! ```

pub mod adapters;
pub mod container;
pub mod errors;
pub mod handlers;
pub mod keys;
pub mod simulator;
pub mod wiring;

pub use container::{ConfigError, SimulationConfig, World};
pub use errors::RuntimeError;
pub use keys::{KeyStore, SharedKey};
pub use simulator::{Simulator, SIMULATOR_ID};
pub use wiring::NodeCommand;
