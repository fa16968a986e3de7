use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use pounce_core::{RoutineStatus, SanitizedConfig};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Service landing page listing the available endpoints.
pub async fn home() -> Json<serde_json::Value> {
    Json(json!({
        "service": "pounce",
        "status": "running",
        "endpoints": {
            "/api/v1/health": "Health check",
            "/api/v1/status": "Service status",
            "/api/v1/run": "Execute one posting pass (POST)",
            "/api/v1/journal": "Recent activity",
            "/api/v1/config": "Sanitized configuration",
            "/api/v1/metrics": "Prometheus metrics"
        }
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<RoutineStatus> {
    Json(state.runner().status())
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}
