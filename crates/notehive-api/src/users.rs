use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use notehive_db::models::UserRow;
use notehive_types::api::{RegisterUserRequest, UpdateUserRequest, UserResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    let db = state.clone();
    let user = run_blocking(move || {
        let group = db.db.get_group(req.group_id)?;
        if group.is_none() {
            return Ok(Err(ApiError::not_found("Group not found")));
        }
        if db.db.get_user_by_email(&email)?.is_some() {
            return Ok(Err(ApiError::bad_request("Email already registered")));
        }
        let user = db.db.create_user(
            Some(req.group_id),
            &req.name,
            &email,
            req.phone.as_deref(),
            req.is_admin,
        )?;
        Ok(Ok(user))
    })
    .await??;

    Ok((StatusCode::CREATED, Json(user_response(user))))
}

pub async fn users_by_group(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let users = run_blocking(move || db.db.list_users_by_group(group_id)).await?;

    let body: Vec<UserResponse> = users.into_iter().map(user_response).collect();
    Ok(Json(body))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user = run_blocking(move || {
        let Some(current) = db.db.get_user(user_id)? else {
            return Ok(Err(ApiError::not_found("User not found")));
        };

        let email = match &req.email {
            Some(email) => {
                let email = email.trim().to_lowercase();
                if let Some(existing) = db.db.get_user_by_email(&email)? {
                    if existing.id != user_id {
                        return Ok(Err(ApiError::bad_request("Email already in use")));
                    }
                }
                email
            }
            None => current.email.clone(),
        };

        let name = req.name.clone().unwrap_or(current.name);
        let phone = req.phone.clone().or(current.phone);
        let is_admin = req.is_admin.unwrap_or(current.is_admin);

        let updated = db
            .db
            .update_user(user_id, &name, &email, phone.as_deref(), is_admin)?;
        match updated {
            Some(user) => Ok(Ok(user)),
            None => Ok(Err(ApiError::not_found("User not found"))),
        }
    })
    .await??;

    Ok(Json(user_response(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let removed = run_blocking(move || db.db.delete_user(user_id)).await?;

    if !removed {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn user_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: row.id,
        group_id: row.group_id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        is_admin: row.is_admin,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
