use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use pounce_core::RoutineError;

use crate::state::AppState;

#[derive(Serialize)]
pub struct RunResponse {
    pub status: String,
    pub message: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<u32>,
    pub execution_mode: String,
}

/// Execute one posting pass. The request blocks until the pass finishes;
/// a pass already in flight yields 409.
pub async fn run_task(State(state): State<Arc<AppState>>) -> (StatusCode, Json<RunResponse>) {
    let start_time = Utc::now();
    info!("Posting pass requested at {}", start_time.to_rfc3339());

    let execution_mode = if state.runner().status().dry_run {
        "dry_run".to_string()
    } else {
        "live".to_string()
    };

    match state.runner().run_once().await {
        Ok(report) => {
            let end_time = Utc::now();
            let duration = (end_time - start_time).num_milliseconds() as f64 / 1000.0;
            info!("Posting pass completed in {:.1}s", duration);

            (
                StatusCode::OK,
                Json(RunResponse {
                    status: "success".to_string(),
                    message: format!("Posted {} of {} targeted items", report.posted, report.quota),
                    start_time: start_time.to_rfc3339(),
                    end_time: end_time.to_rfc3339(),
                    duration_seconds: duration,
                    run_id: Some(report.run_id),
                    posted: Some(report.posted),
                    quota: Some(report.quota),
                    execution_mode,
                }),
            )
        }
        Err(e @ RoutineError::RunInProgress) => {
            let end_time = Utc::now();
            (
                StatusCode::CONFLICT,
                Json(RunResponse {
                    status: "busy".to_string(),
                    message: e.to_string(),
                    start_time: start_time.to_rfc3339(),
                    end_time: end_time.to_rfc3339(),
                    duration_seconds: 0.0,
                    run_id: None,
                    posted: None,
                    quota: None,
                    execution_mode,
                }),
            )
        }
    }
}
