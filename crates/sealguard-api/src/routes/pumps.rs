//! Pump CRUD routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use sealguard_core::error::SealguardError;
use sealguard_core::models::audit::{AuditAction, AuditEntityType, CreateAuditLogEntry};
use sealguard_core::models::pump::{
    CreateExpectedChildTag, CreatePump, Pump, PumpStatus, UpdatePump,
};
use sealguard_core::repository::{
    PumpRepository, StationRepository, UserRepository, VerificationRepository,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, validation_error};
use crate::middleware::CurrentUser;
use crate::response::ApiResponse;
use crate::routes::decode_body;
use crate::routes::stations::client_ip;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpListItem {
    pub id: Uuid,
    pub station_id: Uuid,
    pub station_name: String,
    pub pump_number: u32,
    pub main_rfid_tag: String,
    pub status: PumpStatus,
    pub expected_child_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn list_station_pumps(
    State(state): State<Arc<AppState>>,
    Path(station_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<PumpListItem>>>> {
    let station = state.stations.get_by_id(station_id).await?;
    let pumps = state.pumps.list_by_station(station_id).await?;

    let mut items = Vec::with_capacity(pumps.len());
    for pump in pumps {
        let tags = state.pumps.active_expected_tags(pump.id).await?;
        items.push(PumpListItem {
            id: pump.id,
            station_id: pump.station_id,
            station_name: station.name.clone(),
            pump_number: pump.pump_number,
            main_rfid_tag: pump.main_rfid_tag,
            status: pump.status,
            expected_child_tags: tags.into_iter().map(|tag| tag.tag_id).collect(),
            created_at: pump.created_at,
            updated_at: pump.updated_at,
        });
    }

    Ok(ApiResponse::ok(items))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedTagRequest {
    pub tag_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePumpRequest {
    pub pump_number: i64,
    pub main_rfid_tag: String,
    pub expected_child_tags: Vec<ExpectedTagRequest>,
}

impl CreatePumpRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.pump_number <= 0 || self.pump_number > i64::from(u32::MAX) {
            return Err(validation_error("Pump number must be positive"));
        }
        if self.main_rfid_tag.is_empty() {
            return Err(validation_error("Main RFID tag is required"));
        }
        if self.expected_child_tags.is_empty() {
            return Err(validation_error(
                "At least one expected child tag is required",
            ));
        }
        if self.expected_child_tags.iter().any(|tag| tag.tag_id.is_empty()) {
            return Err(validation_error("Tag ID is required"));
        }
        Ok(())
    }
}

fn tag_inputs(tags: Vec<ExpectedTagRequest>) -> Vec<CreateExpectedChildTag> {
    tags.into_iter()
        .map(|tag| CreateExpectedChildTag {
            tag_id: tag.tag_id,
            description: tag.description,
        })
        .collect()
}

/// `Ok(pump)` from a lookup used as a duplicate probe becomes a
/// DUPLICATE_RESOURCE error; a lookup miss means the slot is free.
fn ensure_absent(
    probe: Result<Pump, SealguardError>,
    skip_id: Option<Uuid>,
    entity: &str,
    message: String,
) -> ApiResult<()> {
    match probe {
        Ok(found) if Some(found.id) == skip_id => Ok(()),
        Ok(_) => Err(ApiError(SealguardError::Duplicate {
            entity: entity.into(),
            message,
        })),
        Err(SealguardError::NotFound { .. }) => Ok(()),
        Err(e) => Err(ApiError(e)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpResponse {
    pub id: Uuid,
    pub station_id: Uuid,
    pub pump_number: u32,
    pub main_rfid_tag: String,
    pub status: PumpStatus,
    pub expected_child_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

async fn pump_response(state: &Arc<AppState>, pump: Pump) -> ApiResult<PumpResponse> {
    let tags = state.pumps.active_expected_tags(pump.id).await?;
    Ok(PumpResponse {
        id: pump.id,
        station_id: pump.station_id,
        pump_number: pump.pump_number,
        main_rfid_tag: pump.main_rfid_tag,
        status: pump.status,
        expected_child_tags: tags.into_iter().map(|tag| tag.tag_id).collect(),
        created_at: pump.created_at,
        updated_at: pump.updated_at,
    })
}

fn pump_snapshot(pump: &Pump) -> serde_json::Value {
    serde_json::json!({
        "id": pump.id,
        "stationId": pump.station_id,
        "pumpNumber": pump.pump_number,
        "mainRfidTag": pump.main_rfid_tag,
        "status": pump.status,
    })
}

pub async fn create_pump(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: axum::http::HeaderMap,
    Path(station_id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let request: CreatePumpRequest = decode_body(body)?;
    request.validate()?;
    let pump_number = request.pump_number as u32;

    // Station must exist.
    state.stations.get_by_id(station_id).await?;

    // Pump number must be free within the station, and the main tag
    // free globally.
    ensure_absent(
        state
            .pumps
            .get_by_station_and_number(station_id, pump_number)
            .await,
        None,
        "pump",
        format!("Pump number {pump_number} already exists for this station"),
    )?;
    ensure_absent(
        state.pumps.get_by_main_tag(&request.main_rfid_tag).await,
        None,
        "pump",
        format!(
            "Main RFID tag '{}' is already in use",
            request.main_rfid_tag
        ),
    )?;

    let pump = state
        .pumps
        .create(CreatePump {
            station_id,
            pump_number,
            main_rfid_tag: request.main_rfid_tag,
            expected_child_tags: tag_inputs(request.expected_child_tags),
        })
        .await?;

    state.audit.record(CreateAuditLogEntry {
        user_id: user.id,
        action: AuditAction::Create,
        entity_type: AuditEntityType::Pump,
        entity_id: pump.id.to_string(),
        old_values: None,
        new_values: Some(pump_snapshot(&pump)),
        ip_address: client_ip(&headers),
    });

    let response = pump_response(&state, pump).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(response)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedTagView {
    pub id: Uuid,
    pub tag_id: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastVerification {
    pub session_id: Uuid,
    pub result: &'static str,
    pub message: String,
    pub username: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpDetail {
    pub id: Uuid,
    pub station_id: Uuid,
    pub station_name: String,
    pub pump_number: u32,
    pub main_rfid_tag: String,
    pub status: PumpStatus,
    pub expected_child_tags: Vec<ExpectedTagView>,
    pub last_verification: Option<LastVerification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn get_pump(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<PumpDetail>>> {
    let pump = state.pumps.get_by_id(id).await?;
    let station = state.stations.get_by_id(pump.station_id).await?;
    let tags = state.pumps.active_expected_tags(id).await?;

    let last_verification = match state.verifications.latest_for_pump(id).await? {
        Some(session) => {
            let username = match session.user_id {
                Some(user_id) => match state.users.get_by_id(user_id).await {
                    Ok(user) => Some(user.username),
                    Err(SealguardError::NotFound { .. }) => None,
                    Err(e) => return Err(ApiError(e)),
                },
                None => None,
            };
            Some(LastVerification {
                session_id: session.id,
                result: session.result.as_lowercase_str(),
                message: session.result_message,
                username,
                timestamp: session.timestamp,
            })
        }
        None => None,
    };

    Ok(ApiResponse::ok(PumpDetail {
        id: pump.id,
        station_id: pump.station_id,
        station_name: station.name,
        pump_number: pump.pump_number,
        main_rfid_tag: pump.main_rfid_tag,
        status: pump.status,
        expected_child_tags: tags
            .into_iter()
            .map(|tag| ExpectedTagView {
                id: tag.id,
                tag_id: tag.tag_id,
                description: tag.description,
                is_active: tag.is_active,
            })
            .collect(),
        last_verification,
        created_at: pump.created_at,
        updated_at: pump.updated_at,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePumpRequest {
    pub pump_number: Option<i64>,
    pub main_rfid_tag: Option<String>,
    pub status: Option<PumpStatus>,
    pub expected_child_tags: Option<Vec<ExpectedTagRequest>>,
}

impl UpdatePumpRequest {
    fn validate(&self) -> ApiResult<()> {
        if let Some(pump_number) = self.pump_number {
            if pump_number <= 0 || pump_number > i64::from(u32::MAX) {
                return Err(validation_error("Pump number must be positive"));
            }
        }
        if let Some(tag) = &self.main_rfid_tag {
            if tag.is_empty() {
                return Err(validation_error("Main RFID tag must not be empty"));
            }
        }
        if let Some(tags) = &self.expected_child_tags {
            if tags.is_empty() {
                return Err(validation_error(
                    "At least one expected child tag is required",
                ));
            }
            if tags.iter().any(|tag| tag.tag_id.is_empty()) {
                return Err(validation_error("Tag ID is required"));
            }
        }
        Ok(())
    }
}

pub async fn update_pump(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: axum::http::HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<ApiResponse<PumpResponse>>> {
    user.require_admin()?;

    let request: UpdatePumpRequest = decode_body(body)?;
    request.validate()?;

    let old = state.pumps.get_by_id(id).await?;

    if let Some(pump_number) = request.pump_number {
        let pump_number = pump_number as u32;
        if pump_number != old.pump_number {
            ensure_absent(
                state
                    .pumps
                    .get_by_station_and_number(old.station_id, pump_number)
                    .await,
                Some(id),
                "pump",
                format!("Pump number {pump_number} already exists for this station"),
            )?;
        }
    }
    if let Some(main_rfid_tag) = &request.main_rfid_tag {
        if *main_rfid_tag != old.main_rfid_tag {
            ensure_absent(
                state.pumps.get_by_main_tag(main_rfid_tag).await,
                Some(id),
                "pump",
                format!("Main RFID tag '{main_rfid_tag}' is already in use"),
            )?;
        }
    }

    let pump = state
        .pumps
        .update(
            id,
            UpdatePump {
                pump_number: request.pump_number.map(|n| n as u32),
                main_rfid_tag: request.main_rfid_tag,
                status: request.status,
                expected_child_tags: request.expected_child_tags.map(tag_inputs),
            },
        )
        .await?;

    state.audit.record(CreateAuditLogEntry {
        user_id: user.id,
        action: AuditAction::Update,
        entity_type: AuditEntityType::Pump,
        entity_id: pump.id.to_string(),
        old_values: Some(pump_snapshot(&old)),
        new_values: Some(pump_snapshot(&pump)),
        ip_address: client_ip(&headers),
    });

    let response = pump_response(&state, pump).await?;
    Ok(ApiResponse::ok(response))
}

pub async fn delete_pump(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: axum::http::HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;

    let old = state.pumps.get_by_id(id).await?;
    state.pumps.delete(id).await?;

    state.audit.record(CreateAuditLogEntry {
        user_id: user.id,
        action: AuditAction::Delete,
        entity_type: AuditEntityType::Pump,
        entity_id: id.to_string(),
        old_values: Some(pump_snapshot(&old)),
        new_values: None,
        ip_address: client_ip(&headers),
    });

    Ok(StatusCode::NO_CONTENT)
}
