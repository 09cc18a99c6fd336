//! # Quantum State Subsystem
//!
//! **Subsystem ID:** qn-02
//!
//! Minimal complex-amplitude toolkit for the simulator: basis preparation,
//! projective and Bell-basis measurement, tensor products, partial traces and
//! Kraus noise channels over `num-complex` amplitudes.
//!
//! ```text
//!   Ket ──(noise / partial trace)──► DensityMatrix
//!    │                                   │
//!    └──────────── QuantumState ─────────┘
//!                      │
//!                    Qubit  (standalone | Bell-pair half)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use qn_02_quantum_state::{BellState, Qubit};
//! use rand::SeedableRng;
//! use shared_types::BellOutcome;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let (a, b) = Qubit::bell_pair(BellState::PhiPlus);
//! assert_eq!(Qubit::bell_measurement(a, b, &mut rng).unwrap(), BellOutcome(0, 0));
//! ```

pub mod domain;

pub use domain::*;
