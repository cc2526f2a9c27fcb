//! Power sequencing for the relay-switched drive.

pub mod removal;
pub mod sequencer;
pub mod types;

pub use removal::SafeRemoval;
pub use sequencer::{PowerSequencer, SequenceSettings};
pub use types::{OperationKind, OperationResult, SequencePhase, SleepOptions};
