//! Domain models for RideWatch.
//!
//! ## Submodules
//!
//! - [`exam`] - Examination types offered by the booking service
//! - [`slot`] - Slots and their stable identity
//! - [`session`] - Authenticated session state
//! - [`event`] - Change events and poll diffs

mod event;
mod exam;
mod session;
mod slot;

// Re-export everything at the models level
pub use event::{ChangeEvent, ChangeKind, DiffResult};
pub use exam::ExamType;
pub use session::{Session, SessionState};
pub use slot::{START_TIME_FORMAT, Slot, SlotId};
#[cfg(test)]
mod serde_tests;
