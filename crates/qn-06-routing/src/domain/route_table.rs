//! # Route Table
//!
//! Undirected graph over classical nodes. Neighbor lists keep insertion
//! order, so breadth-first search visits them in the order connections were
//! added and ties between equal-length paths always resolve the same way.
//!
//! Paths are recomputed on every query; nothing is cached.

use std::collections::{HashMap, VecDeque};

use qn_01_topology::Topology;
use shared_types::entities::NodeId;
use tracing::debug;

use super::errors::RoutingError;

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    adjacency: HashMap<NodeId, Vec<NodeId>>,
    edge_count: usize,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every classical edge of `topology`, in topology order.
    pub fn from_topology(topology: &Topology) -> Self {
        let mut table = Self::new();
        for edge in topology.classical_edges() {
            let (a, b) = &edge.endpoints;
            table.add_edge(a.clone(), b.clone());
        }
        debug!(
            nodes = table.node_count(),
            edges = table.edge_count(),
            "[qn-06] Route table built"
        );
        table
    }

    /// Insert an undirected edge. Duplicates and self-loops are ignored.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.neighbors(&a).contains(&b) {
            return;
        }
        self.adjacency.entry(a.clone()).or_default().push(b.clone());
        self.adjacency.entry(b).or_default().push(a);
        self.edge_count += 1;
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn neighbors(&self, node: &NodeId) -> &[NodeId] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Unweighted shortest path from `from` to `to`, both inclusive.
    ///
    /// `Some(vec![from])` when the two coincide.
    pub fn shortest_path(&self, from: &NodeId, to: &NodeId) -> Option<Vec<NodeId>> {
        if from == to {
            return self.contains(from).then(|| vec![from.clone()]);
        }
        let mut parent: HashMap<&NodeId, &NodeId> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        parent.insert(from, from);

        while let Some(node) = queue.pop_front() {
            for next in self.neighbors(node) {
                if parent.contains_key(next) {
                    continue;
                }
                parent.insert(next, node);
                if next == to {
                    return Some(Self::unwind(&parent, from, to));
                }
                queue.push_back(next);
            }
        }
        None
    }

    pub fn get_path(&self, from: &NodeId, to: &NodeId) -> Result<Vec<NodeId>, RoutingError> {
        self.shortest_path(from, to)
            .ok_or_else(|| RoutingError::RouteNotFound {
                from: from.clone(),
                to: to.clone(),
            })
    }

    fn unwind(parent: &HashMap<&NodeId, &NodeId>, from: &NodeId, to: &NodeId) -> Vec<NodeId> {
        let mut path = vec![to.clone()];
        let mut cursor = to;
        while cursor != from {
            match parent.get(cursor) {
                Some(prev) => {
                    path.push((*prev).clone());
                    cursor = prev;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}
