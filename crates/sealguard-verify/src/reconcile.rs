//! Tag set reconciliation.
//!
//! Pure comparison of a pump's expected child tags against the
//! sequence physically read by a field operator. No I/O, no hidden
//! state: the same inputs always produce the same diff.

use std::collections::HashSet;

use sealguard_core::models::verification::VerificationResult;

/// Fixed message for a clean verification.
pub const SUCCESS_MESSAGE: &str = "All RFID tags verified successfully. Pump is secure.";

/// Outcome of comparing expected vs. scanned tag identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Expected tags absent from the scanned sequence, in expected
    /// (creation) order.
    pub missing_tags: Vec<String>,
    /// Scanned entries not present in the expected set, in original
    /// scan order, duplicates preserved.
    pub unexpected_tags: Vec<String>,
    /// SUCCESS iff both diff lists are empty.
    pub outcome: VerificationResult,
    /// Every scanned entry counts, duplicates included.
    pub total_scanned: u32,
}

/// Compare an expected tag set against a scanned sequence.
///
/// Matching is set-based: a duplicate scan of an expected tag matches
/// it once and cannot stand in for a different expected tag, but
/// still counts toward `total_scanned`.
pub fn reconcile(expected: &[String], scanned: &[String]) -> Reconciliation {
    let expected_set: HashSet<&str> = expected.iter().map(String::as_str).collect();
    let scanned_set: HashSet<&str> = scanned.iter().map(String::as_str).collect();

    let mut seen_expected = HashSet::new();
    let missing_tags: Vec<String> = expected
        .iter()
        .filter(|tag| seen_expected.insert(tag.as_str()))
        .filter(|tag| !scanned_set.contains(tag.as_str()))
        .cloned()
        .collect();

    let unexpected_tags: Vec<String> = scanned
        .iter()
        .filter(|tag| !expected_set.contains(tag.as_str()))
        .cloned()
        .collect();

    let outcome = if missing_tags.is_empty() && unexpected_tags.is_empty() {
        VerificationResult::Success
    } else {
        VerificationResult::Failed
    };

    Reconciliation {
        missing_tags,
        unexpected_tags,
        outcome,
        total_scanned: scanned.len() as u32,
    }
}

/// Build the human-readable result message for a reconciliation.
///
/// FAILED messages list each problem as a clause, joined by commas
/// and wrapped in an alarm marker.
pub fn result_message(reconciliation: &Reconciliation) -> String {
    if reconciliation.outcome == VerificationResult::Success {
        return SUCCESS_MESSAGE.to_string();
    }

    let mut issues = Vec::new();
    if !reconciliation.missing_tags.is_empty() {
        issues.push(format!(
            "{} tag(s) missing or broken",
            reconciliation.missing_tags.len()
        ));
    }
    if !reconciliation.unexpected_tags.is_empty() {
        issues.push(format!(
            "{} unexpected tag(s) detected",
            reconciliation.unexpected_tags.len()
        ));
    }

    format!(
        "ALERT: {}. Pump may have been tampered with!",
        issues.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_tags_present_is_success() {
        let r = reconcile(&tags(&["A", "B", "C"]), &tags(&["A", "B", "C"]));
        assert_eq!(r.outcome, VerificationResult::Success);
        assert!(r.missing_tags.is_empty());
        assert!(r.unexpected_tags.is_empty());
        assert_eq!(r.total_scanned, 3);
    }

    #[test]
    fn scan_order_does_not_matter_for_outcome() {
        let r = reconcile(&tags(&["A", "B", "C"]), &tags(&["C", "A", "B"]));
        assert_eq!(r.outcome, VerificationResult::Success);
    }

    #[test]
    fn absent_tag_is_missing() {
        let r = reconcile(&tags(&["A", "B", "C"]), &tags(&["A", "B"]));
        assert_eq!(r.outcome, VerificationResult::Failed);
        assert_eq!(r.missing_tags, tags(&["C"]));
        assert!(r.unexpected_tags.is_empty());
    }

    #[test]
    fn foreign_tag_is_unexpected() {
        let r = reconcile(&tags(&["A", "B"]), &tags(&["A", "B", "X"]));
        assert_eq!(r.outcome, VerificationResult::Failed);
        assert!(r.missing_tags.is_empty());
        assert_eq!(r.unexpected_tags, tags(&["X"]));
    }

    #[test]
    fn empty_scan_yields_all_missing() {
        let r = reconcile(&tags(&["A", "B", "C"]), &[]);
        assert_eq!(r.outcome, VerificationResult::Failed);
        assert_eq!(r.missing_tags, tags(&["A", "B", "C"]));
        assert_eq!(r.total_scanned, 0);
    }

    #[test]
    fn empty_expected_and_empty_scan_is_success() {
        let r = reconcile(&[], &[]);
        assert_eq!(r.outcome, VerificationResult::Success);
    }

    #[test]
    fn duplicate_scan_matches_once_but_counts_toward_total() {
        // A scanned twice cannot stand in for B.
        let r = reconcile(&tags(&["A", "B"]), &tags(&["A", "A"]));
        assert_eq!(r.outcome, VerificationResult::Failed);
        assert_eq!(r.missing_tags, tags(&["B"]));
        assert!(r.unexpected_tags.is_empty());
        assert_eq!(r.total_scanned, 2);
    }

    #[test]
    fn duplicate_unexpected_tags_are_preserved_in_scan_order() {
        let r = reconcile(&tags(&["A"]), &tags(&["X", "A", "Y", "X"]));
        assert_eq!(r.unexpected_tags, tags(&["X", "Y", "X"]));
        assert_eq!(r.total_scanned, 4);
    }

    #[test]
    fn missing_tags_follow_expected_order() {
        let r = reconcile(&tags(&["C", "A", "B"]), &tags(&["A"]));
        assert_eq!(r.missing_tags, tags(&["C", "B"]));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let expected = tags(&["A", "B", "C"]);
        let scanned = tags(&["B", "X"]);
        assert_eq!(reconcile(&expected, &scanned), reconcile(&expected, &scanned));
    }

    #[test]
    fn success_message_is_fixed() {
        let r = reconcile(&tags(&["A"]), &tags(&["A"]));
        assert_eq!(result_message(&r), SUCCESS_MESSAGE);
    }

    #[test]
    fn failure_message_lists_each_issue() {
        let r = reconcile(&tags(&["A", "B"]), &tags(&["X"]));
        assert_eq!(
            result_message(&r),
            "ALERT: 2 tag(s) missing or broken, 1 unexpected tag(s) detected. \
             Pump may have been tampered with!"
        );
    }

    #[test]
    fn failure_message_with_only_missing_tags() {
        let r = reconcile(&tags(&["A", "B"]), &[]);
        assert_eq!(
            result_message(&r),
            "ALERT: 2 tag(s) missing or broken. Pump may have been tampered with!"
        );
    }
}
