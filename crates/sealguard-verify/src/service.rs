//! Verification orchestration — the end-to-end flow for one
//! verification attempt, plus the replay used by detail views.

use sealguard_core::error::{SealguardError, SealguardResult};
use sealguard_core::models::pump::{Pump, PumpStatus};
use sealguard_core::models::verification::{
    CreateScannedChildTag, CreateVerificationSession, ScannedChildTag, VerificationSession,
};
use sealguard_core::repository::{PumpRepository, VerificationRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::reconcile::{reconcile, result_message};
use crate::transition::next_status;

/// Input for one verification attempt.
#[derive(Debug)]
pub struct VerifyInput {
    pub main_tag_scanned: String,
    /// Tags as physically read; may be empty, duplicates preserved.
    pub scanned_child_tags: Vec<String>,
}

/// Result of a verification attempt.
#[derive(Debug)]
pub struct VerifyOutcome {
    pub session: VerificationSession,
    pub expected_count: u32,
    pub missing_tags: Vec<String>,
    pub unexpected_tags: Vec<String>,
    /// Pump status after any transition.
    pub pump_status: PumpStatus,
}

/// A stored session replayed for a detail view.
#[derive(Debug)]
pub struct SessionDetail {
    pub session: VerificationSession,
    pub pump: Pump,
    /// The pump's *currently* active expected tag ids.
    pub expected_tags: Vec<String>,
    pub scanned_tags: Vec<ScannedChildTag>,
    /// Recomputed: current expected set minus stored scanned ids.
    pub missing_tags: Vec<String>,
    /// Stored scanned tags with `is_expected == false`, scan order
    /// preserved.
    pub unexpected_tags: Vec<String>,
}

/// Verification service.
///
/// Generic over repository implementations so the engine has no
/// dependency on the database crate.
pub struct VerificationService<P: PumpRepository, V: VerificationRepository> {
    pump_repo: P,
    verification_repo: V,
}

impl<P: PumpRepository, V: VerificationRepository> VerificationService<P, V> {
    pub fn new(pump_repo: P, verification_repo: V) -> Self {
        Self {
            pump_repo,
            verification_repo,
        }
    }

    /// Run one verification attempt against a pump.
    ///
    /// On a main-tag mismatch no session is written and the pump is
    /// untouched. Otherwise the reconciliation outcome is recorded
    /// atomically and a FAILED check on a LOCKED pump trips the
    /// tamper alarm.
    pub async fn verify(
        &self,
        pump_id: Uuid,
        user_id: Option<Uuid>,
        input: VerifyInput,
    ) -> SealguardResult<VerifyOutcome> {
        // 1. Load the pump.
        let pump = self.pump_repo.get_by_id(pump_id).await?;

        // 2. The scanned main tag must identify this pump, or the
        //    engine does not run at all.
        if pump.main_rfid_tag != input.main_tag_scanned {
            return Err(SealguardError::MainTagMismatch {
                scanned: input.main_tag_scanned,
                expected: pump.main_rfid_tag,
            });
        }

        // 3. Reconcile against the currently active expected set.
        let expected = self.pump_repo.active_expected_tags(pump_id).await?;
        let expected_ids: Vec<String> =
            expected.into_iter().map(|tag| tag.tag_id).collect();
        let reconciliation = reconcile(&expected_ids, &input.scanned_child_tags);
        let message = result_message(&reconciliation);

        // 4. Trip the tamper alarm if warranted. Idempotent: two
        //    concurrent failed verifications both set BROKEN.
        let new_status = next_status(pump.status, reconciliation.outcome);
        if new_status != pump.status {
            warn!(
                pump_id = %pump_id,
                from = pump.status.as_str(),
                to = new_status.as_str(),
                "Tamper alarm: pump status transition"
            );
            self.pump_repo.set_status(pump_id, new_status).await?;
        }

        // 5. Record the session and its scanned tags atomically.
        let expected_set: std::collections::HashSet<&str> =
            expected_ids.iter().map(String::as_str).collect();
        let scanned_tags: Vec<CreateScannedChildTag> = input
            .scanned_child_tags
            .iter()
            .enumerate()
            .map(|(index, tag_id)| CreateScannedChildTag {
                tag_id: tag_id.clone(),
                scan_order: index as u32 + 1,
                is_expected: expected_set.contains(tag_id.as_str()),
            })
            .collect();

        let session = self
            .verification_repo
            .create(CreateVerificationSession {
                pump_id,
                user_id,
                main_tag_scanned: input.main_tag_scanned,
                result: reconciliation.outcome,
                missing_tags_count: reconciliation.missing_tags.len() as u32,
                unexpected_tags_count: reconciliation.unexpected_tags.len() as u32,
                total_scanned: reconciliation.total_scanned,
                result_message: message,
                scanned_tags,
            })
            .await?;

        info!(
            pump_id = %pump_id,
            session_id = %session.id,
            result = reconciliation.outcome.as_str(),
            missing = reconciliation.missing_tags.len(),
            unexpected = reconciliation.unexpected_tags.len(),
            "Verification recorded"
        );

        Ok(VerifyOutcome {
            session,
            expected_count: expected_ids.len() as u32,
            missing_tags: reconciliation.missing_tags,
            unexpected_tags: reconciliation.unexpected_tags,
            pump_status: new_status,
        })
    }

    /// Replay a stored session for a detail view.
    ///
    /// Missing tags are recomputed against the pump's *current*
    /// active expected set, so later expected-tag changes shift the
    /// historical picture; `is_expected` on each scanned tag remains
    /// the scan-time snapshot.
    pub async fn session_detail(&self, session_id: Uuid) -> SealguardResult<SessionDetail> {
        let session = self.verification_repo.get_by_id(session_id).await?;
        let pump = self.pump_repo.get_by_id(session.pump_id).await?;

        let expected_tags: Vec<String> = self
            .pump_repo
            .active_expected_tags(pump.id)
            .await?
            .into_iter()
            .map(|tag| tag.tag_id)
            .collect();

        let scanned_tags = self.verification_repo.scanned_tags(session_id).await?;

        let scanned_ids: std::collections::HashSet<&str> =
            scanned_tags.iter().map(|tag| tag.tag_id.as_str()).collect();

        let missing_tags: Vec<String> = expected_tags
            .iter()
            .filter(|tag| !scanned_ids.contains(tag.as_str()))
            .cloned()
            .collect();

        let unexpected_tags: Vec<String> = scanned_tags
            .iter()
            .filter(|tag| !tag.is_expected)
            .map(|tag| tag.tag_id.clone())
            .collect();

        Ok(SessionDetail {
            session,
            pump,
            expected_tags,
            scanned_tags,
            missing_tags,
            unexpected_tags,
        })
    }
}
