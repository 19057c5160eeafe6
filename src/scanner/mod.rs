//! The gate-station side of ticketing: decode a scanned payload, toggle the
//! attendee's entry/exit state, and signal the operator.

pub mod capture;
pub mod feedback;
pub mod gate;

pub use capture::{CaptureError, CaptureLoop, CaptureState};
pub use feedback::{FeedbackController, GateStation, ScanFeedback};
pub use gate::{EntrySignal, GateError, GateProcessor, RejectReason, ScanOutcome};
