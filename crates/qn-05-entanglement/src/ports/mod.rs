pub mod outbound;

pub use outbound::QuantumNeighborhood;
