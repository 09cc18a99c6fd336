//! Domain layer for the channel subsystem.

pub mod classical;
pub mod errors;
pub mod inbound;
pub mod quantum_channel;

pub use classical::ClassicalConnection;
pub use errors::ChannelError;
pub use inbound::{ChannelId, Inbound};
pub use quantum_channel::{Propagation, QuantumChannel};
