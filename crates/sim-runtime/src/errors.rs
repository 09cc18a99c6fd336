//! Runtime error types.

use shared_types::errors::SimulationError;
use thiserror::Error;

use crate::container::ConfigError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Workers can be spawned once per simulator.
    #[error("simulation already started")]
    AlreadyStarted,

    #[error("simulation is not running")]
    NotRunning,
}
