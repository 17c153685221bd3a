use axum::Json;
use serde_json::{Value, json};

use crate::response::ApiResponse;

/// Liveness probe.
pub async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        json!({
            "status": "ok",
            "service": common::config::project_name(),
        }),
        "Service healthy",
    ))
}
