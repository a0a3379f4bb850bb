//! API routes.

pub mod admin;
pub mod auth;
pub mod pumps;
pub mod stations;
pub mod verifications;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use chrono::{DateTime, Utc};
use sealguard_core::error::SealguardError;
use sealguard_core::models::verification::VerificationResult;
use sealguard_core::repository::{Pagination, UserRepository};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, validation_error};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Decode a request body against its typed schema, rejecting with
/// VALIDATION_ERROR on any mismatch.
pub fn decode_body<T: DeserializeOwned>(value: serde_json::Value) -> ApiResult<T> {
    serde_json::from_value(value)
        .map_err(|e| validation_error(format!("Invalid input data: {e}")))
}

/// Parse `page`/`limit` query values into repository pagination.
///
/// Returns `(page, Pagination)`. Page must be ≥ 1; limit must be
/// within 1–100.
pub fn parse_pagination(
    page: Option<&str>,
    limit: Option<&str>,
    default_limit: u64,
) -> ApiResult<(u64, Pagination)> {
    let page = match page {
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| validation_error("page must be a positive integer"))?,
        None => 1,
    };
    let limit = match limit {
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|l| (1..=100).contains(l))
            .ok_or_else(|| validation_error("limit must be between 1 and 100"))?,
        None => default_limit,
    };

    Ok((
        page,
        Pagination {
            offset: (page - 1) * limit,
            limit,
        },
    ))
}

/// Parse an optional RFC 3339 timestamp query value.
pub fn parse_datetime(raw: Option<&str>, field: &str) -> ApiResult<Option<DateTime<Utc>>> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| validation_error(format!("{field} must be an RFC 3339 datetime")))
    })
    .transpose()
}

/// Parse an optional verification result filter. `all` (any case)
/// means no filter.
pub fn parse_result_filter(raw: Option<&str>) -> ApiResult<Option<VerificationResult>> {
    match raw {
        None => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value
            .to_uppercase()
            .parse::<VerificationResult>()
            .map(Some)
            .map_err(|_| validation_error("result must be one of SUCCESS, FAILED, ERROR, all")),
    }
}

/// Parse an optional UUID path/query value.
pub fn parse_uuid(raw: &str, field: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| validation_error(format!("{field} must be a UUID")))
}

/// Resolve user display names (full name, falling back to username)
/// for a set of user ids, tolerating users that no longer resolve.
pub async fn user_display_names(
    state: &Arc<AppState>,
    ids: impl Iterator<Item = Uuid>,
) -> ApiResult<HashMap<Uuid, (String, Option<String>)>> {
    let mut names = HashMap::new();
    for id in ids {
        if names.contains_key(&id) {
            continue;
        }
        match state.users.get_by_id(id).await {
            Ok(user) => {
                names.insert(id, (user.username, user.full_name));
            }
            Err(SealguardError::NotFound { .. }) => {}
            Err(e) => return Err(ApiError(e)),
        }
    }
    Ok(names)
}
