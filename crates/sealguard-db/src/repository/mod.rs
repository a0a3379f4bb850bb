//! SurrealDB repository implementations.

mod audit;
mod auth_token;
mod pump;
mod station;
mod user;
mod verification;

pub use audit::SurrealAuditLogRepository;
pub use auth_token::SurrealAuthTokenRepository;
pub use pump::SurrealPumpRepository;
pub use station::SurrealStationRepository;
pub use user::SurrealUserRepository;
pub use verification::SurrealVerificationRepository;
