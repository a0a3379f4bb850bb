//! Gas station CRUD routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use sealguard_core::models::audit::{AuditAction, AuditEntityType, CreateAuditLogEntry};
use sealguard_core::models::station::{
    CreateStation, GasStation, StationStatus, UpdateStation,
};
use sealguard_core::repository::{PumpRepository, StationFilter, StationRepository};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiResult, validation_error};
use crate::middleware::CurrentUser;
use crate::response::{ApiResponse, PaginationMeta};
use crate::routes::{decode_body, parse_pagination};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StationListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationListItem {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub status: StationStatus,
    pub pump_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_status_filter(raw: Option<&str>) -> ApiResult<Option<StationStatus>> {
    match raw {
        None => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value
            .to_uppercase()
            .parse::<StationStatus>()
            .map(Some)
            .map_err(|_| {
                validation_error("status must be one of ACTIVE, INACTIVE, MAINTENANCE, all")
            }),
    }
}

pub async fn list_stations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StationListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<StationListItem>>>> {
    let (page, pagination) =
        parse_pagination(query.page.as_deref(), query.limit.as_deref(), 20)?;
    let filter = StationFilter {
        status: parse_status_filter(query.status.as_deref())?,
        search: query.search.clone(),
    };

    let result = state.stations.list(&filter, pagination).await?;

    let mut items = Vec::with_capacity(result.items.len());
    for station in result.items {
        let pump_count = state.pumps.count_by_station(station.id).await?;
        items.push(StationListItem {
            id: station.id,
            name: station.name,
            location: station.location,
            status: station.status,
            pump_count,
            created_at: station.created_at,
            updated_at: station.updated_at,
        });
    }

    Ok(ApiResponse::paginated(
        items,
        PaginationMeta::new(page, result.limit, result.total),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationPumpSummary {
    pub id: Uuid,
    pub pump_number: u32,
    pub main_rfid_tag: String,
    pub status: sealguard_core::models::pump::PumpStatus,
    pub expected_child_tags_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDetail {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub status: StationStatus,
    pub last_modified_by: Option<Uuid>,
    pub pump_count: usize,
    pub pumps: Vec<StationPumpSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn get_station(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<StationDetail>>> {
    let station = state.stations.get_by_id(id).await?;
    let pumps = state.pumps.list_by_station(id).await?;

    let mut summaries = Vec::with_capacity(pumps.len());
    for pump in &pumps {
        let expected_child_tags_count =
            state.pumps.count_active_expected_tags(pump.id).await?;
        summaries.push(StationPumpSummary {
            id: pump.id,
            pump_number: pump.pump_number,
            main_rfid_tag: pump.main_rfid_tag.clone(),
            status: pump.status,
            expected_child_tags_count,
        });
    }

    Ok(ApiResponse::ok(StationDetail {
        id: station.id,
        name: station.name,
        location: station.location,
        status: station.status,
        last_modified_by: station.last_modified_by,
        pump_count: summaries.len(),
        pumps: summaries,
        created_at: station.created_at,
        updated_at: station.updated_at,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateStationRequest {
    pub name: String,
    pub location: String,
}

impl CreateStationRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.name.is_empty() || self.name.len() > 255 {
            return Err(validation_error("name must be 1-255 characters"));
        }
        if self.location.is_empty() || self.location.len() > 255 {
            return Err(validation_error("location must be 1-255 characters"));
        }
        Ok(())
    }
}

fn station_snapshot(station: &GasStation) -> serde_json::Value {
    serde_json::json!({
        "id": station.id,
        "name": station.name,
        "location": station.location,
        "status": station.status,
    })
}

/// Extract a best-effort client address for audit entries.
pub fn client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
}

pub async fn create_station(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: axum::http::HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let request: CreateStationRequest = decode_body(body)?;
    request.validate()?;

    let station = state
        .stations
        .create(CreateStation {
            name: request.name,
            location: request.location,
        })
        .await?;

    state.audit.record(CreateAuditLogEntry {
        user_id: user.id,
        action: AuditAction::Create,
        entity_type: AuditEntityType::Station,
        entity_id: station.id.to_string(),
        old_values: None,
        new_values: Some(station_snapshot(&station)),
        ip_address: client_ip(&headers),
    });

    Ok((StatusCode::CREATED, ApiResponse::ok(station)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStationRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub status: Option<StationStatus>,
}

impl UpdateStationRequest {
    fn validate(&self) -> ApiResult<()> {
        if let Some(name) = &self.name {
            if name.is_empty() || name.len() > 255 {
                return Err(validation_error("name must be 1-255 characters"));
            }
        }
        if let Some(location) = &self.location {
            if location.is_empty() || location.len() > 255 {
                return Err(validation_error("location must be 1-255 characters"));
            }
        }
        Ok(())
    }
}

pub async fn update_station(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: axum::http::HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<ApiResponse<GasStation>>> {
    user.require_admin()?;

    let request: UpdateStationRequest = decode_body(body)?;
    request.validate()?;

    let old = state.stations.get_by_id(id).await?;

    let station = state
        .stations
        .update(
            id,
            UpdateStation {
                name: request.name,
                location: request.location,
                status: request.status,
                last_modified_by: Some(user.id),
            },
        )
        .await?;

    state.audit.record(CreateAuditLogEntry {
        user_id: user.id,
        action: AuditAction::Update,
        entity_type: AuditEntityType::Station,
        entity_id: station.id.to_string(),
        old_values: Some(station_snapshot(&old)),
        new_values: Some(station_snapshot(&station)),
        ip_address: client_ip(&headers),
    });

    Ok(ApiResponse::ok(station))
}

pub async fn delete_station(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: axum::http::HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;

    let old = state.stations.get_by_id(id).await?;
    state.stations.delete(id).await?;

    state.audit.record(CreateAuditLogEntry {
        user_id: user.id,
        action: AuditAction::Delete,
        entity_type: AuditEntityType::Station,
        entity_id: id.to_string(),
        old_values: Some(station_snapshot(&old)),
        new_values: None,
        ip_address: client_ip(&headers),
    });

    Ok(StatusCode::NO_CONTENT)
}
