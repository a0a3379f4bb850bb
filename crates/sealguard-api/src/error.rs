//! Error-to-response mapping.
//!
//! Every domain error maps to one stable error code and HTTP status;
//! raw storage errors never reach the wire.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sealguard_core::error::SealguardError;
use serde_json::json;
use tracing::error;

/// Wrapper turning a [`SealguardError`] into an enveloped HTTP
/// response.
#[derive(Debug)]
pub struct ApiError(pub SealguardError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<SealguardError> for ApiError {
    fn from(err: SealguardError) -> Self {
        ApiError(err)
    }
}

/// Shorthand for a VALIDATION_ERROR response.
pub fn validation_error(message: impl Into<String>) -> ApiError {
    ApiError(SealguardError::Validation {
        message: message.into(),
    })
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            SealguardError::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            SealguardError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE_RESOURCE"),
            SealguardError::MainTagMismatch { .. } => {
                (StatusCode::BAD_REQUEST, "MAIN_TAG_MISMATCH")
            }
            SealguardError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            SealguardError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            SealguardError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            SealguardError::PermissionDenied { .. } => {
                (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSIONS")
            }
            SealguardError::RateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            SealguardError::Database(_)
            | SealguardError::Crypto(_)
            | SealguardError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Do not leak internals on the wire.
            "An unexpected error occurred".to_string()
        } else {
            self.0.to_string()
        };

        let body = json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError(SealguardError::NotFound {
            entity: "pump".into(),
            id: "x".into(),
        });
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"));
    }

    #[test]
    fn main_tag_mismatch_is_a_400_with_its_own_code() {
        let err = ApiError(SealguardError::MainTagMismatch {
            scanned: "a".into(),
            expected: "b".into(),
        });
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "MAIN_TAG_MISMATCH"));
    }

    #[test]
    fn database_errors_are_masked() {
        let err = ApiError(SealguardError::Database("secret dsn".into()));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[test]
    fn duplicate_maps_to_409() {
        let err = ApiError(SealguardError::Duplicate {
            entity: "pump".into(),
            message: "pump number 3".into(),
        });
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "DUPLICATE_RESOURCE"));
    }
}
