//! Outbound Ports (Driven Ports)
//!
//! Channels never own receivers; they hand items to whatever implements
//! [`InboxSink`]. The runtime backs it with bounded per-node queues.

use shared_types::entities::NodeId;

use crate::domain::errors::ChannelError;
use crate::domain::inbound::Inbound;

pub trait InboxSink: Send + Sync {
    /// Non-blocking hand-off into `to`'s inbox.
    fn deliver(&self, to: &NodeId, item: Inbound) -> Result<(), ChannelError>;
}

impl<T: InboxSink + ?Sized> InboxSink for std::sync::Arc<T> {
    fn deliver(&self, to: &NodeId, item: Inbound) -> Result<(), ChannelError> {
        (**self).deliver(to, item)
    }
}
