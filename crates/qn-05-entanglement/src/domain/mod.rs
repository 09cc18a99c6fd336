//! Domain layer for entanglement swapping.

pub mod correction;
pub mod errors;
pub mod memory;
pub mod session;

pub use correction::PauliCorrection;
pub use errors::EntanglementError;
pub use memory::RepeaterMemory;
pub use session::{CorrectionRequest, EntanglementPhase, EntanglementSession, EstablishedLink};
