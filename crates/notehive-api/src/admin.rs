use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "notehive ok" }))
}

/// Wipe every table. Development convenience used by clients to start a
/// clean demo environment.
pub async fn reset(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    run_blocking(move || db.db.reset_all()).await?;

    info!("System reset: all groups, users, notes and events removed");
    Ok(Json(json!({ "status": "reset_complete" })))
}
