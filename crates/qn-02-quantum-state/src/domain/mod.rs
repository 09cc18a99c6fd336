//! Domain layer: pure linear algebra, no I/O.

pub mod density;
pub mod errors;
pub mod ket;
pub mod measurement;
pub mod noise;
pub mod operator;
pub mod qubit;
pub mod state;

pub use density::DensityMatrix;
pub use errors::{StateError, StateResult};
pub use ket::Ket;
pub use operator::Operator;
pub use qubit::{PairId, Qubit};
pub use state::{BellState, QuantumState};
