//! Cross-crate simulation scenarios.

pub mod fixtures;

mod bb84;
mod entanglement;
mod lifecycle;
mod routing;
