//! Service Layer
//!
//! Orchestrates repeater memory and Bell measurement against the
//! [`QuantumNeighborhood`](crate::ports::QuantumNeighborhood) port.

pub mod repeater;

pub use repeater::{resolve_end_host, CorrectionDispatch, RepeaterAction, RepeaterService};
