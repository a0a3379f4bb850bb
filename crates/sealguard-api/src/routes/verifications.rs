//! Verification routes: submission, history, and detail replay.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use sealguard_core::models::pump::PumpStatus;
use sealguard_core::repository::{StationRepository, VerificationFilter, VerificationRepository};
use sealguard_verify::service::VerifyInput;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiResult, validation_error};
use crate::middleware::CurrentUser;
use crate::response::{ApiResponse, PaginationMeta};
use crate::routes::{
    decode_body, parse_datetime, parse_pagination, parse_result_filter, user_display_names,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub main_tag_scanned: String,
    /// May be empty; order and duplicates are preserved.
    #[serde(default)]
    pub scanned_child_tags: Vec<String>,
}

impl VerifyRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.main_tag_scanned.is_empty() {
            return Err(validation_error("Main tag is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDetails {
    pub expected_count: u32,
    pub scanned_count: u32,
    pub missing_tags: Vec<String>,
    pub unexpected_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub session_id: Uuid,
    pub result: &'static str,
    pub message: String,
    pub details: VerifyDetails,
    pub pump_status: PumpStatus,
    pub timestamp: DateTime<Utc>,
}

pub async fn verify_pump(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<ApiResponse<VerifyResponse>>> {
    let request: VerifyRequest = decode_body(body)?;
    request.validate()?;

    let outcome = state
        .verifier
        .verify(
            id,
            Some(user.id),
            VerifyInput {
                main_tag_scanned: request.main_tag_scanned,
                scanned_child_tags: request.scanned_child_tags,
            },
        )
        .await?;

    Ok(ApiResponse::ok(VerifyResponse {
        session_id: outcome.session.id,
        result: outcome.session.result.as_lowercase_str(),
        message: outcome.session.result_message.clone(),
        details: VerifyDetails {
            expected_count: outcome.expected_count,
            scanned_count: outcome.session.total_scanned,
            missing_tags: outcome.missing_tags,
            unexpected_tags: outcome.unexpected_tags,
        },
        pump_status: outcome.pump_status,
        timestamp: outcome.session.timestamp,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub result: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub session_id: Uuid,
    pub pump_id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub main_tag_scanned: String,
    pub result: &'static str,
    pub missing_tags_count: u32,
    pub unexpected_tags_count: u32,
    pub total_scanned: u32,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

pub async fn get_pump_verifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<ApiResponse<Vec<HistoryItem>>>> {
    let (page, pagination) =
        parse_pagination(query.page.as_deref(), query.limit.as_deref(), 20)?;
    let filter = VerificationFilter {
        result: parse_result_filter(query.result.as_deref())?,
        station_id: None,
        from: parse_datetime(query.start_date.as_deref(), "startDate")?,
        to: parse_datetime(query.end_date.as_deref(), "endDate")?,
    };

    let result = state
        .verifications
        .list_for_pump(id, &filter, pagination)
        .await?;

    let names =
        user_display_names(&state, result.items.iter().filter_map(|s| s.user_id)).await?;

    let items = result
        .items
        .into_iter()
        .map(|session| {
            let username = session
                .user_id
                .and_then(|user_id| names.get(&user_id))
                .map(|(username, _)| username.clone());
            HistoryItem {
                session_id: session.id,
                pump_id: session.pump_id,
                user_id: session.user_id,
                username,
                main_tag_scanned: session.main_tag_scanned,
                result: session.result.as_lowercase_str(),
                missing_tags_count: session.missing_tags_count,
                unexpected_tags_count: session.unexpected_tags_count,
                total_scanned: session.total_scanned,
                message: session.result_message,
                timestamp: session.timestamp,
            }
        })
        .collect();

    Ok(ApiResponse::paginated(
        items,
        PaginationMeta::new(page, result.limit, result.total),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedTagView {
    pub tag_id: String,
    pub scan_order: u32,
    pub is_expected: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailResponse {
    pub session_id: Uuid,
    pub pump_id: Uuid,
    pub pump_number: u32,
    pub station_id: Uuid,
    pub station_name: String,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub user_full_name: Option<String>,
    pub main_tag_scanned: String,
    pub result: &'static str,
    pub message: String,
    pub expected_tags: Vec<String>,
    pub scanned_tags: Vec<ScannedTagView>,
    pub missing_tags: Vec<String>,
    pub unexpected_tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

pub async fn get_verification_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<SessionDetailResponse>>> {
    let detail = state.verifier.session_detail(session_id).await?;
    let station = state.stations.get_by_id(detail.pump.station_id).await?;

    let names =
        user_display_names(&state, detail.session.user_id.into_iter()).await?;
    let (username, user_full_name) = detail
        .session
        .user_id
        .and_then(|user_id| names.get(&user_id))
        .map(|(username, full_name)| (Some(username.clone()), full_name.clone()))
        .unwrap_or((None, None));

    Ok(ApiResponse::ok(SessionDetailResponse {
        session_id: detail.session.id,
        pump_id: detail.pump.id,
        pump_number: detail.pump.pump_number,
        station_id: station.id,
        station_name: station.name,
        user_id: detail.session.user_id,
        username,
        user_full_name,
        main_tag_scanned: detail.session.main_tag_scanned,
        result: detail.session.result.as_lowercase_str(),
        message: detail.session.result_message,
        expected_tags: detail.expected_tags,
        scanned_tags: detail
            .scanned_tags
            .into_iter()
            .map(|tag| ScannedTagView {
                tag_id: tag.tag_id,
                scan_order: tag.scan_order,
                is_expected: tag.is_expected,
            })
            .collect(),
        missing_tags: detail.missing_tags,
        unexpected_tags: detail.unexpected_tags,
        timestamp: detail.session.timestamp,
    }))
}
