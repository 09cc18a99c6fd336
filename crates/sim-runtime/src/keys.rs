//! Completed keys, written by host workers and read by the simulator.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::entities::{Bit, NodeId};

/// The outcome of one successful BB84 round at one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedKey {
    pub peer: NodeId,
    pub key: Vec<Bit>,
    pub round: u32,
    /// Known only on the host that decided the round.
    pub error_rate: Option<f64>,
}

/// Latest key per host. Cloning shares the store.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<HashMap<NodeId, SharedKey>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` for `host`, replacing any earlier round.
    pub fn insert(&self, host: NodeId, key: SharedKey) {
        self.inner.write().insert(host, key);
    }

    pub fn get(&self, host: &NodeId) -> Option<SharedKey> {
        self.inner.read().get(host).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<NodeId, SharedKey> {
        self.inner.read().clone()
    }
}
