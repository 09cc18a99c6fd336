//! # Quantum-Net Test Suite
//!
//! End-to-end scenarios that run a full [`sim_runtime::Simulator`] and assert
//! on the event stream it publishes.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs      # Fast configs, launch helper, event polling
//!     ├── routing.rs       # Classical forwarding and adapters
//!     ├── bb84.rs          # Key agreement, eavesdropping, retries
//!     ├── entanglement.rs  # Repeater swaps and memory limits
//!     └── lifecycle.rs     # Start/stop behaviour
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qn-tests
//! cargo test -p qn-tests integration::bb84::
//! ```

pub mod integration;
