use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use notehive_db::models::GroupRow;
use notehive_types::api::{CreateGroupRequest, GroupResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("group name must not be empty"));
    }

    let db = state.clone();
    let group =
        run_blocking(move || db.db.create_group(req.name.trim(), req.description.as_deref()))
            .await?;

    Ok((StatusCode::CREATED, Json(group_response(group))))
}

pub async fn list_groups(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let groups = run_blocking(move || db.db.list_groups()).await?;

    let body: Vec<GroupResponse> = groups.into_iter().map(group_response).collect();
    Ok(Json(body))
}

pub(crate) fn group_response(row: GroupRow) -> GroupResponse {
    GroupResponse {
        id: row.id,
        name: row.name,
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
