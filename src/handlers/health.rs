use axum::extract::State;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::store;

/// GET /health
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    store::health_check(&state.pool)
        .await
        .map_err(|err| {
            tracing::error!("health check failed: {}", err);
            ApiError::internal("database unavailable")
        })?;

    Ok(ApiResponse::success(json!({
        "status": "healthy",
        "database": "connected",
    })))
}
