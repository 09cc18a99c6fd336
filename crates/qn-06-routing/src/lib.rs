//! # Classical Routing Subsystem
//!
//! **Subsystem ID:** qn-06
//!
//! One [`RouteTable`] per simulation, built from the topology's classical
//! edges and shared read-only by every classical node through a
//! [`Forwarder`].
//!
//! ```text
//!  packet arrives ──► append hop ──► destination == self? ──yes──► Deliver
//!                                          │no
//!                             shortest_path(self, destination)
//!                                          │
//!                          path[1] = next hop ──► connection to it
//!                                          │
//!                                  Forward { next_hop, connection }
//! ```
//!
//! A missing path yields `RouteNotFound`, a path whose next hop has no direct
//! connection yields `ConnectionNotFound`. Either drops the packet only.

pub mod domain;

pub use domain::*;
