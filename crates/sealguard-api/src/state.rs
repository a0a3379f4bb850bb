//! Application state shared across handlers.
//!
//! Every component is explicitly constructed from an injected
//! database handle — no module-level singletons.

use sealguard_auth::config::AuthConfig;
use sealguard_auth::service::AuthService;
use sealguard_db::repository::{
    SurrealAuditLogRepository, SurrealAuthTokenRepository, SurrealPumpRepository,
    SurrealStationRepository, SurrealUserRepository, SurrealVerificationRepository,
};
use sealguard_verify::service::VerificationService;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use crate::audit::AuditRecorder;

/// Shared state for axum request handlers.
pub struct AppState {
    pub stations: SurrealStationRepository<Any>,
    pub pumps: SurrealPumpRepository<Any>,
    pub verifications: SurrealVerificationRepository<Any>,
    pub users: SurrealUserRepository<Any>,
    pub auth: AuthService<SurrealUserRepository<Any>, SurrealAuthTokenRepository<Any>>,
    pub verifier: VerificationService<SurrealPumpRepository<Any>, SurrealVerificationRepository<Any>>,
    pub audit_logs: SurrealAuditLogRepository<Any>,
    pub audit: AuditRecorder,
    pub auth_config: AuthConfig,
}

impl AppState {
    /// Wire up repositories and services around one database handle.
    pub fn new(db: Surreal<Any>, auth_config: AuthConfig) -> Self {
        let stations = SurrealStationRepository::new(db.clone());
        let pumps = SurrealPumpRepository::new(db.clone());
        let verifications = SurrealVerificationRepository::new(db.clone());
        let users = match &auth_config.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };
        let tokens = SurrealAuthTokenRepository::new(db.clone());
        let audit_logs = SurrealAuditLogRepository::new(db);

        let auth = AuthService::new(users.clone(), tokens, auth_config.clone());
        let verifier = VerificationService::new(pumps.clone(), verifications.clone());
        let audit = AuditRecorder::new(audit_logs.clone());

        Self {
            stations,
            pumps,
            verifications,
            users,
            auth,
            verifier,
            audit_logs,
            audit,
            auth_config,
        }
    }
}
