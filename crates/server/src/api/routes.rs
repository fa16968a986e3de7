use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, journal, metrics, run};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::get_status))
        .route("/config", get(handlers::get_config))
        // Trigger one posting pass
        .route("/run", post(run::run_task))
        // Recent activity
        .route("/journal", get(journal::recent))
        // Prometheus exposition
        .route("/metrics", get(metrics::exposition))
        .with_state(state);

    Router::new()
        .route("/", get(handlers::home))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
