//! Domain layer for BB84: pure state machines, no transport.

pub mod eavesdropper;
pub mod errors;
pub mod session;
pub mod sifting;

pub use eavesdropper::InterceptResend;
pub use errors::Bb84Error;
pub use session::{Bb84Phase, Bb84Role, Bb84Session, Bb84Step, RoundOutcome};
pub use sifting::{draw_sample, estimate_error_rate, reconcile, sample_size, BasisRecord};
