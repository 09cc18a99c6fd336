//! Routing error types.

use shared_types::entities::NodeId;
use shared_types::errors::SimulationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no route from {from} to {to}")]
    RouteNotFound { from: NodeId, to: NodeId },

    #[error("no connection from {from} to next hop {to}")]
    ConnectionNotFound { from: NodeId, to: NodeId },
}

impl From<RoutingError> for SimulationError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::RouteNotFound { from, to } => Self::RouteNotFound { from, to },
            RoutingError::ConnectionNotFound { from, to } => Self::ConnectionNotFound { from, to },
        }
    }
}

impl RoutingError {
    /// Label for the dropped-packet metric.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "route_not_found",
            Self::ConnectionNotFound { .. } => "connection_not_found",
        }
    }
}
