//! # Channel Subsystem
//!
//! **Subsystem ID:** qn-03
//!
//! Transport between nodes. Quantum channels apply loss and noise to qubits;
//! classical connections move packets unchanged. Both hand their payload to
//! the receiver through the [`InboxSink`] port, tagged with the sender.
//!
//! ```text
//!  sender ──► QuantumChannel ──(erasure, noise)──┐
//!                                                ├──► InboxSink ──► receiver inbox
//!  sender ──► ClassicalConnection ───────────────┘
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::MemorySink;
pub use domain::*;
pub use ports::InboxSink;

/// Re-exported so callers can name noise models without depending on topology.
pub use qn_01_topology::NoiseModel;
