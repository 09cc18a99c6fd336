//! Domain layer for the topology subsystem.

pub mod entities;
pub mod errors;
pub mod topology;
pub mod validation;

pub use entities::*;
pub use errors::*;
pub use topology::*;
