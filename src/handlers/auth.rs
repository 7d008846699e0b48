use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::domain::Principal;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::auth::{LoginResponse, UserSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let resp = state.auth.login(&req.username, &req.password).await?;
    Ok(ApiResponse::success(resp))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<UserSummary> {
    let user = state.auth.current_user(principal.user_id).await?;
    Ok(ApiResponse::success(user))
}
