//! # Wiring
//!
//! Hand-off queues between node workers.

pub mod mailbox;

pub use mailbox::{Inbox, Mailboxes, NodeCommand, WorkerInput};
