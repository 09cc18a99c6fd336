//! In-memory sink that records every hand-off. Used by unit tests and by
//! single-threaded drivers that step nodes by hand.

use parking_lot::Mutex;
use shared_types::entities::NodeId;

use crate::domain::errors::ChannelError;
use crate::domain::inbound::Inbound;
use crate::ports::InboxSink;

#[derive(Debug, Default)]
pub struct MemorySink {
    items: Mutex<Vec<(NodeId, Inbound)>>,
}

impl MemorySink {
    /// Drain everything delivered so far, in delivery order.
    pub fn take(&self) -> Vec<(NodeId, Inbound)> {
        std::mem::take(&mut *self.items.lock())
    }

    /// Drain only the items addressed to `node`.
    pub fn take_for(&self, node: &NodeId) -> Vec<Inbound> {
        let mut items = self.items.lock();
        let (mine, rest): (Vec<_>, Vec<_>) = items.drain(..).partition(|(to, _)| to == node);
        *items = rest;
        mine.into_iter().map(|(_, item)| item).collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl InboxSink for MemorySink {
    fn deliver(&self, to: &NodeId, item: Inbound) -> Result<(), ChannelError> {
        self.items.lock().push((to.clone(), item));
        Ok(())
    }
}
