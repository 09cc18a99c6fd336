//! Per-node random generators.
//!
//! With a master seed every node gets `StdRng::seed_from_u64(siphash(seed,
//! node))`, so a replayed topology and seed reproduces each node's basis and
//! bit choices regardless of worker interleaving.

use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_types::entities::NodeId;
use siphasher::sip::SipHasher13;

pub fn node_seed(seed: u64, node: &NodeId) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(seed, 0);
    node.as_str().hash(&mut hasher);
    hasher.finish()
}

pub fn node_rng(seed: Option<u64>, node: &NodeId) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(node_seed(seed, node)),
        None => StdRng::from_entropy(),
    }
}
