//! # BB84 Key-Agreement Subsystem
//!
//! **Subsystem ID:** qn-04
//!
//! One [`Bb84Session`] per quantum host. The initiator prepares random
//! basis/bit pairs, the responder measures in random bases, and the two
//! reconcile bases, sample the shared bits to estimate the error rate and
//! either extract the key or fall back to `Retry`.
//!
//! ```text
//!  initiator                         responder
//!  ─────────                         ─────────
//!  begin_sending ── qubits ────────► on_qubit × num_bits
//!  on_reconcile_bases ◄── bases ──── (last qubit)
//!       ── shared indices ─────────► on_shared_indices
//!  on_error_sample ◄── sample ─────
//!       ── complete | error_rate ──► on_complete | on_error_rate
//! ```
//!
//! The session never touches a channel; the caller transmits what it returns.
//! [`InterceptResend`] models an eavesdropper sitting on the quantum path.

pub mod domain;

pub use domain::*;
