//! Authentication routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use sealguard_auth::service::LoginInput;
use sealguard_core::models::user::User;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiResult, validation_error};
use crate::middleware::{CurrentUser, bearer_token};
use crate::response::ApiResponse;
use crate::routes::decode_body;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.username.is_empty() {
            return Err(validation_error("Username is required"));
        }
        if self.password.is_empty() {
            return Err(validation_error("Password is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub role: &'static str,
}

impl UserSummary {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: UserSummary,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let request: LoginRequest = decode_body(body)?;
    request.validate()?;

    let output = state
        .auth
        .login(LoginInput {
            username: request.username,
            password: request.password,
        })
        .await?;

    Ok(ApiResponse::ok(LoginResponse {
        user: UserSummary::from_user(&output.user),
        access_token: output.access_token,
        token_type: output.token_type,
        expires_in: output.expires_in,
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if let Some(token) = bearer_token(&headers) {
        state.auth.logout(user.id, token).await?;
    }

    Ok(ApiResponse::ok(json!({
        "message": "Successfully logged out"
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub role: &'static str,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<UserInfo>>> {
    let user = state.auth.current_user(user.id).await?;

    Ok(ApiResponse::ok(UserInfo {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        role: user.role.as_str(),
        is_active: user.is_active,
        last_login: user.last_login,
        created_at: user.created_at,
    }))
}
