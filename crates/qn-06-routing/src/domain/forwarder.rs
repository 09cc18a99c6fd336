//! Per-node forwarding decision.

use std::sync::Arc;

use qn_03_channels::ClassicalConnection;
use shared_types::entities::NodeId;
use shared_types::messages::ClassicDataPacket;
use tracing::trace;

use super::errors::RoutingError;
use super::route_table::RouteTable;

/// What to do with a packet that reached this node.
#[derive(Debug, Clone, PartialEq)]
pub enum Route<'a> {
    /// Addressed here.
    Deliver,
    Forward {
        next_hop: NodeId,
        connection: &'a ClassicalConnection,
    },
}

/// Forwarding for one node, reading the shared route table.
#[derive(Debug, Clone)]
pub struct Forwarder {
    node: NodeId,
    table: Arc<RouteTable>,
}

impl Forwarder {
    pub fn new(node: NodeId, table: Arc<RouteTable>) -> Self {
        Self { node, table }
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Record this node on `packet` and pick the next hop toward its
    /// destination among this node's `connections`.
    ///
    /// `packet.next_hop` is set when a hop is chosen, even if no connection
    /// to it exists.
    pub fn route<'c>(
        &self,
        packet: &mut ClassicDataPacket,
        connections: &'c [ClassicalConnection],
    ) -> Result<Route<'c>, RoutingError> {
        packet.append_hop(&self.node);
        if packet.destination == self.node {
            return Ok(Route::Deliver);
        }

        let path = self.table.get_path(&self.node, &packet.destination)?;
        let next_hop = path.get(1).cloned().ok_or_else(|| RoutingError::RouteNotFound {
            from: self.node.clone(),
            to: packet.destination.clone(),
        })?;
        packet.next_hop = Some(next_hop.clone());

        let connection = connections
            .iter()
            .find(|c| c.connects(&self.node, &next_hop))
            .ok_or_else(|| RoutingError::ConnectionNotFound {
                from: self.node.clone(),
                to: next_hop.clone(),
            })?;
        trace!(node = %self.node, packet = %packet.id, next_hop = %next_hop, "[qn-06] Next hop chosen");
        Ok(Route::Forward { next_hop, connection })
    }
}
