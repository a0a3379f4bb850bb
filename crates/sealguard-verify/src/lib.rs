//! Sealguard Verify — the RFID tag verification engine.
//!
//! Pure reconciliation and state-transition functions, plus the
//! service that orchestrates a verification attempt end to end:
//! reconcile the scanned tags against the pump's expected set, trip
//! the tamper alarm if warranted, and record the immutable session.

pub mod reconcile;
pub mod service;
pub mod transition;

pub use reconcile::{Reconciliation, reconcile, result_message};
pub use service::{SessionDetail, VerificationService, VerifyInput, VerifyOutcome};
pub use transition::next_status;
