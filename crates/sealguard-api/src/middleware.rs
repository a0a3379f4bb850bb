//! Request authentication middleware and role gates.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use sealguard_auth::token;
use sealguard_core::error::SealguardError;
use sealguard_core::models::user::UserRole;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated request context, inserted into request extensions by
/// [`authenticate`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Role gate for mutating station/pump operations.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError(SealguardError::PermissionDenied {
                reason: "Admin role required".into(),
            }))
        }
    }
}

/// Extract the raw bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Middleware validating the bearer JWT (signature, expiry, issuer)
/// and inserting [`CurrentUser`] into the request extensions.
///
/// Purely stateless — no database lookup per request.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        ApiError(SealguardError::InvalidToken {
            reason: "missing bearer token".into(),
        })
    })?;

    let claims = token::validate_access_token(token, &state.auth_config)
        .map_err(SealguardError::from)
        .map_err(ApiError)?
        .0;

    let id = Uuid::parse_str(&claims.sub).map_err(|_| {
        ApiError(SealguardError::InvalidToken {
            reason: "malformed subject claim".into(),
        })
    })?;
    let role = claims.role.parse::<UserRole>().map_err(|_| {
        ApiError(SealguardError::InvalidToken {
            reason: "malformed role claim".into(),
        })
    })?;

    request.extensions_mut().insert(CurrentUser {
        id,
        username: claims.username,
        role,
    });

    Ok(next.run(request).await)
}

/// Middleware gating a subtree to admin-capable roles. Must run after
/// [`authenticate`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request.extensions().get::<CurrentUser>().ok_or_else(|| {
        ApiError(SealguardError::PermissionDenied {
            reason: "Admin role required".into(),
        })
    })?;

    user.require_admin()?;
    Ok(next.run(request).await)
}
