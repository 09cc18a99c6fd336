//! # Shared Bus - Simulation Event Stream
//!
//! Every node worker reports its state transitions here; external
//! collaborators (dashboards, log summarizers, tests) consume them.
//!
//! ## Rules
//!
//! - Workers publish, they never read the bus to make protocol decisions.
//! - The stream is append-only: a published event is never modified or
//!   removed, and [`InMemoryEventBus::history`] replays it in publish order.
//! - Every event carries a dense `sequence` number, so a late joiner using
//!   [`InMemoryEventBus::follow`] gets the backlog and the live tail with no
//!   gap and no duplicate.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Node worker  │                    │ Collaborator │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │  + journal   │ ─────────┘
//!                  └──────────────┘  follow() / subscribe() / history()
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventLevel, EventTopic, EventType, SimulationEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{tally, EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
