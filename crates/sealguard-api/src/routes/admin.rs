//! Admin routes: analytics, audit logs, fleet-wide verification
//! listing, and station modification history.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use sealguard_core::error::SealguardError;
use sealguard_core::models::audit::{AuditAction, AuditEntityType};
use sealguard_core::models::pump::Pump;
use sealguard_core::models::station::StationStatus;
use sealguard_core::models::verification::VerificationResult;
use sealguard_core::repository::{
    AuditLogFilter, AuditLogRepository, PumpRepository, StationRepository, VerificationFilter,
    VerificationRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, validation_error};
use crate::response::{ApiResponse, PaginationMeta};
use crate::routes::{
    parse_datetime, parse_pagination, parse_result_filter, parse_uuid, user_display_names,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total_stations: u64,
    pub total_pumps: u64,
    pub active_stations: u64,
    pub verifications_today_count: u64,
    pub verifications_week_count: u64,
    pub failed_verifications_week: u64,
    pub success_rate: f64,
}

pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<AnalyticsResponse>>> {
    let now = Utc::now();
    let today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);
    let week_ago = today - Duration::days(7);

    let total_stations = state.stations.count().await?;
    let total_pumps = state.pumps.count().await?;
    let active_stations = state.stations.count_by_status(StationStatus::Active).await?;
    let verifications_today_count =
        state.verifications.count_since(Some(today), None).await?;
    let verifications_week_count =
        state.verifications.count_since(Some(week_ago), None).await?;
    let failed_verifications_week = state
        .verifications
        .count_since(Some(week_ago), Some(VerificationResult::Failed))
        .await?;
    let successful_verifications_week = state
        .verifications
        .count_since(Some(week_ago), Some(VerificationResult::Success))
        .await?;

    let success_rate = if verifications_week_count > 0 {
        let rate =
            successful_verifications_week as f64 / verifications_week_count as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    } else {
        0.0
    };

    Ok(ApiResponse::ok(AnalyticsResponse {
        total_stations,
        total_pumps,
        active_stations,
        verifications_today_count,
        verifications_week_count,
        failed_verifications_week,
        success_rate,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn get_audit_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AuditLogItem>>>> {
    let (page, pagination) =
        parse_pagination(query.page.as_deref(), query.limit.as_deref(), 50)?;

    let action = query
        .action
        .as_deref()
        .map(|raw| {
            raw.to_uppercase()
                .parse::<AuditAction>()
                .map_err(|_| validation_error("action must be one of CREATE, UPDATE, DELETE"))
        })
        .transpose()?;
    let entity_type = query
        .entity_type
        .as_deref()
        .map(|raw| {
            raw.to_uppercase().parse::<AuditEntityType>().map_err(|_| {
                validation_error(
                    "entityType must be one of STATION, PUMP, USER, VERIFICATION",
                )
            })
        })
        .transpose()?;
    let user_id = query
        .user_id
        .as_deref()
        .map(|raw| parse_uuid(raw, "userId"))
        .transpose()?;

    let filter = AuditLogFilter {
        user_id,
        action,
        entity_type,
        from: parse_datetime(query.start_date.as_deref(), "startDate")?,
        to: parse_datetime(query.end_date.as_deref(), "endDate")?,
    };

    let result = state.audit_logs.list(&filter, pagination).await?;

    let names =
        user_display_names(&state, result.items.iter().map(|log| log.user_id)).await?;

    let items = result
        .items
        .into_iter()
        .map(|log| {
            let user_name = names
                .get(&log.user_id)
                .map(|(username, full_name)| full_name.clone().unwrap_or_else(|| username.clone()));
            AuditLogItem {
                id: log.id,
                user_id: log.user_id,
                user_name,
                action: log.action.as_str(),
                entity_type: log.entity_type.as_str(),
                entity_id: log.entity_id,
                old_values: log.old_values,
                new_values: log.new_values,
                ip_address: log.ip_address,
                created_at: log.created_at,
            }
        })
        .collect();

    Ok(ApiResponse::paginated(
        items,
        PaginationMeta::new(page, result.limit, result.total),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllVerificationsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub result: Option<String>,
    pub station_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetVerificationDetails {
    pub expected_count: u32,
    pub scanned_count: u32,
    pub unexpected_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetVerificationItem {
    pub session_id: Uuid,
    pub pump_id: Uuid,
    pub pump_number: Option<u32>,
    pub station_id: Option<Uuid>,
    pub station_name: Option<String>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub result: &'static str,
    pub message: String,
    pub details: FleetVerificationDetails,
    pub pump_status: Option<sealguard_core::models::pump::PumpStatus>,
    pub timestamp: DateTime<Utc>,
}

pub async fn get_all_verifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AllVerificationsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<FleetVerificationItem>>>> {
    let (page, pagination) =
        parse_pagination(query.page.as_deref(), query.limit.as_deref(), 50)?;

    let filter = VerificationFilter {
        result: parse_result_filter(query.result.as_deref())?,
        station_id: query
            .station_id
            .as_deref()
            .map(|raw| parse_uuid(raw, "stationId"))
            .transpose()?,
        from: parse_datetime(query.start_date.as_deref(), "startDate")?,
        to: parse_datetime(query.end_date.as_deref(), "endDate")?,
    };

    let result = state.verifications.list_all(&filter, pagination).await?;

    let names =
        user_display_names(&state, result.items.iter().filter_map(|s| s.user_id)).await?;

    // Resolve pump and station rows once per page; pumps may have been
    // deleted since the session was recorded.
    let mut pumps: HashMap<Uuid, Option<Pump>> = HashMap::new();
    let mut station_names: HashMap<Uuid, String> = HashMap::new();
    for session in &result.items {
        if !pumps.contains_key(&session.pump_id) {
            let pump = match state.pumps.get_by_id(session.pump_id).await {
                Ok(pump) => Some(pump),
                Err(SealguardError::NotFound { .. }) => None,
                Err(e) => return Err(ApiError(e)),
            };
            if let Some(pump) = &pump {
                if !station_names.contains_key(&pump.station_id) {
                    let station = state.stations.get_by_id(pump.station_id).await?;
                    station_names.insert(pump.station_id, station.name);
                }
            }
            pumps.insert(session.pump_id, pump);
        }
    }

    let mut items = Vec::with_capacity(result.items.len());
    for session in result.items {
        let unexpected_tags: Vec<String> = state
            .verifications
            .scanned_tags(session.id)
            .await?
            .into_iter()
            .filter(|tag| !tag.is_expected)
            .map(|tag| tag.tag_id)
            .collect();

        // Reconstruct the expected-set size from the stored counts.
        let expected_count =
            session.total_scanned - session.unexpected_tags_count + session.missing_tags_count;

        let pump = pumps.get(&session.pump_id).and_then(|p| p.as_ref());
        let user_name = session
            .user_id
            .and_then(|user_id| names.get(&user_id))
            .map(|(username, full_name)| full_name.clone().unwrap_or_else(|| username.clone()));

        items.push(FleetVerificationItem {
            session_id: session.id,
            pump_id: session.pump_id,
            pump_number: pump.map(|p| p.pump_number),
            station_id: pump.map(|p| p.station_id),
            station_name: pump
                .and_then(|p| station_names.get(&p.station_id))
                .cloned(),
            user_id: session.user_id,
            user_name,
            result: session.result.as_lowercase_str(),
            message: session.result_message,
            details: FleetVerificationDetails {
                expected_count,
                scanned_count: session.total_scanned,
                unexpected_tags,
            },
            pump_status: pump.map(|p| p.status),
            timestamp: session.timestamp,
        });
    }

    Ok(ApiResponse::paginated(
        items,
        PaginationMeta::new(page, result.limit, result.total),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationLogItem {
    pub id: Uuid,
    pub action: &'static str,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub modified_by: Option<String>,
    pub modified_at: DateTime<Utc>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationLogsResponse {
    pub station_id: Uuid,
    pub station_name: String,
    pub last_modified_at: DateTime<Utc>,
    pub last_modified_by: Option<String>,
    pub logs: Vec<StationLogItem>,
}

/// Station modification history: the last 100 audit entries.
pub async fn get_station_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<StationLogsResponse>>> {
    let station = state.stations.get_by_id(id).await?;

    let logs = state
        .audit_logs
        .list_for_entity(AuditEntityType::Station, &id.to_string(), 100)
        .await?;

    let names = user_display_names(
        &state,
        logs.iter()
            .map(|log| log.user_id)
            .chain(station.last_modified_by),
    )
    .await?;
    let display_name = |user_id: &Uuid| {
        names
            .get(user_id)
            .map(|(username, full_name)| full_name.clone().unwrap_or_else(|| username.clone()))
    };

    let last_modified_by = station.last_modified_by.as_ref().and_then(display_name);

    Ok(ApiResponse::ok(StationLogsResponse {
        station_id: station.id,
        station_name: station.name,
        last_modified_at: station.updated_at,
        last_modified_by,
        logs: logs
            .into_iter()
            .map(|log| StationLogItem {
                id: log.id,
                action: log.action.as_str(),
                old_values: log.old_values,
                new_values: log.new_values,
                modified_by: display_name(&log.user_id),
                modified_at: log.created_at,
                ip_address: log.ip_address,
            })
            .collect(),
    }))
}
