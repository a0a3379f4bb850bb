//! Authentication error types.

use sealguard_core::error::SealguardError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("password does not satisfy policy: {0}")]
    PasswordPolicy(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for SealguardError {
    fn from(err: AuthError) -> Self {
        match err {
            // An inactive account is deliberately indistinguishable
            // from bad credentials on the wire.
            AuthError::InvalidCredentials | AuthError::AccountInactive => {
                SealguardError::InvalidCredentials
            }
            AuthError::PasswordPolicy(msg) => SealguardError::Validation { message: msg },
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => SealguardError::InvalidToken {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => SealguardError::Crypto(msg),
        }
    }
}
