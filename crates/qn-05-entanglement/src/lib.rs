//! # Entanglement Swapping Subsystem
//!
//! **Subsystem ID:** qn-05
//!
//! End hosts share a key over repeaters by swapping entanglement: each host
//! keeps one half of a `|Φ+⟩` pair and sends the other toward the repeater
//! chain. A repeater holding two halves performs a Bell measurement and tells
//! one end host which Pauli correction turns its retained half into the
//! partner of the far host's half.
//!
//! ```text
//!  alice                r1                r2                 bob
//!  ─────                ──                ──                 ───
//!  request ── half ───► forward ── half ─► store
//!                                          store ◄── half ── request
//!                                          Bell measurement
//!  apply_correction ◄──────── (m1, m2), other = bob ─────────
//!  EntanglementEstablished ──────────────────────────────► accept_link
//! ```
//!
//! | Outcome | Correction |
//! |---------|------------|
//! | (0, 0)  | I          |
//! | (0, 1)  | X          |
//! | (1, 0)  | Z          |
//! | (1, 1)  | Y = X·Z    |

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::QuantumNeighborhood;
pub use service::{resolve_end_host, CorrectionDispatch, RepeaterAction, RepeaterService};
