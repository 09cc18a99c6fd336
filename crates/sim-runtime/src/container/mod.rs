//! # Simulation Container
//!
//! Configuration and the shared, read-only world every worker sees.

pub mod config;
pub mod world;

pub use config::{ConfigError, SimulationConfig};
pub use world::World;
