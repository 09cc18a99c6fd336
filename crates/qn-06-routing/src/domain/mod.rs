//! Domain layer for classical routing.

pub mod errors;
pub mod forwarder;
pub mod route_table;

pub use errors::RoutingError;
pub use forwarder::{Forwarder, Route};
pub use route_table::RouteTable;
