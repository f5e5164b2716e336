// handlers/health.rs - GET /health handler

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::response::ApiResult;

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    if let Err(e) = state.directory.health_check().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}
