//! Error types for the Sealguard system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SealguardError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}: {message}")]
    Duplicate { entity: String, message: String },

    /// Domain-specific precondition failure, distinct from generic
    /// validation: the scanned main tag does not identify this pump.
    #[error("Main tag '{scanned}' does not match pump's main tag '{expected}'")]
    MainTagMismatch { scanned: String, expected: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired token: {reason}")]
    InvalidToken { reason: String },

    #[error("Insufficient permissions: {reason}")]
    PermissionDenied { reason: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SealguardResult<T> = Result<T, SealguardError>;
