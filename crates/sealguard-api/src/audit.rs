//! Post-response audit recording.
//!
//! Mutating station/pump handlers hand their audit entry to this
//! recorder; the write runs on a detached task so it can never block
//! or fail the response already being sent. Failures are logged and
//! swallowed.

use sealguard_core::models::audit::CreateAuditLogEntry;
use sealguard_core::repository::AuditLogRepository;
use sealguard_db::repository::SurrealAuditLogRepository;
use surrealdb::engine::any::Any;
use tracing::warn;

#[derive(Clone)]
pub struct AuditRecorder {
    repo: SurrealAuditLogRepository<Any>,
}

impl AuditRecorder {
    pub fn new(repo: SurrealAuditLogRepository<Any>) -> Self {
        Self { repo }
    }

    /// Fire-and-forget append of one audit entry.
    pub fn record(&self, entry: CreateAuditLogEntry) {
        let repo = self.repo.clone();
        tokio::spawn(async move {
            if let Err(err) = repo.append(entry).await {
                warn!(error = %err, "Audit logging failed");
            }
        });
    }
}
