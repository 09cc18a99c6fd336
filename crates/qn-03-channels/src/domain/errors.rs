//! Channel error types.

use qn_02_quantum_state::StateError;
use shared_types::entities::NodeId;
use shared_types::errors::SimulationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// The sender is not an endpoint of the channel.
    #[error("{node} is not an endpoint of channel {channel}")]
    UnknownSender { channel: String, node: NodeId },

    #[error("state error in transit: {0}")]
    State(#[from] StateError),

    /// The receiver's inbox refused the item.
    #[error("delivery to {to} failed: {reason}")]
    Delivery { to: NodeId, reason: String },
}

impl From<ChannelError> for SimulationError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::UnknownSender { node, .. } => SimulationError::ChannelNotFound(node),
            ChannelError::State(e) => SimulationError::InvalidQuantumState(e.to_string()),
            ChannelError::Delivery { to, reason } => SimulationError::DeliveryFailed { to, reason },
        }
    }
}
