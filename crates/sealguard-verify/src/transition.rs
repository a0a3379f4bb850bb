//! Pump status transition rule.

use sealguard_core::models::pump::PumpStatus;
use sealguard_core::models::verification::VerificationResult;

/// Compute the pump status after a verification.
///
/// The only automatic transition is the tamper alarm: a FAILED
/// reconciliation on a LOCKED pump trips it to BROKEN. Everything
/// else — including a later SUCCESS on a BROKEN pump — leaves the
/// status alone; restoration is an explicit admin action.
pub fn next_status(current: PumpStatus, outcome: VerificationResult) -> PumpStatus {
    match (current, outcome) {
        (PumpStatus::Locked, VerificationResult::Failed) => PumpStatus::Broken,
        (status, _) => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_on_locked_trips_alarm() {
        assert_eq!(
            next_status(PumpStatus::Locked, VerificationResult::Failed),
            PumpStatus::Broken
        );
    }

    #[test]
    fn success_never_changes_status() {
        for status in [PumpStatus::Locked, PumpStatus::Open, PumpStatus::Broken] {
            assert_eq!(next_status(status, VerificationResult::Success), status);
        }
    }

    #[test]
    fn failed_on_open_or_broken_is_a_no_op() {
        assert_eq!(
            next_status(PumpStatus::Open, VerificationResult::Failed),
            PumpStatus::Open
        );
        assert_eq!(
            next_status(PumpStatus::Broken, VerificationResult::Failed),
            PumpStatus::Broken
        );
    }

    #[test]
    fn error_outcome_changes_nothing() {
        for status in [PumpStatus::Locked, PumpStatus::Open, PumpStatus::Broken] {
            assert_eq!(next_status(status, VerificationResult::Error), status);
        }
    }
}
