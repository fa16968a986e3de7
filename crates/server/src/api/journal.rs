use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use pounce_core::JournalRecord;

use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Most recent journal events, newest first.
pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JournalQuery>,
) -> Json<Vec<JournalRecord>> {
    let limit = query.limit.min(MAX_LIMIT);
    Json(state.journal_store().recent(limit))
}
