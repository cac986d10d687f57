//! Email-based group invitations: create, list, preview, revoke, accept.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{NaiveDateTime, Utc};
use tracing::warn;

use notehive_db::models::InvitationRow;
use notehive_types::api::{
    AcceptInviteRequest, AcceptInviteResponse, CreateInviteRequest, InvitePreviewResponse,
    InviteResponse,
};

use crate::error::ApiError;
use crate::groups::group_response;
use crate::state::{AppState, run_blocking};
use crate::users::user_response;

pub async fn create_invite(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Json(req): Json<CreateInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase);

    let db = state.clone();
    let invite = run_blocking(move || {
        if db.db.get_group(group_id)?.is_none() {
            return Ok(Err(ApiError::not_found("Group not found")));
        }
        let invite = db.db.create_invitation(
            group_id,
            email.as_deref(),
            req.created_by_user_id,
            req.expires_in_days,
        )?;
        Ok(Ok(invite))
    })
    .await??;

    Ok((StatusCode::CREATED, Json(invite_response(invite))))
}

pub async fn list_invites(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let invites = run_blocking(move || {
        if db.db.get_group(group_id)?.is_none() {
            return Ok(Err(ApiError::not_found("Group not found")));
        }
        Ok(Ok(db.db.list_invitations(group_id)?))
    })
    .await??;

    let body: Vec<InviteResponse> = invites.into_iter().map(invite_response).collect();
    Ok(Json(body))
}

pub async fn preview_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (invite, group) = run_blocking(move || {
        let Some(invite) = db.db.get_invitation_by_token(&token)? else {
            return Ok(Err(ApiError::not_found("Invitation not found")));
        };
        let Some(group) = db.db.get_group(invite.group_id)? else {
            return Ok(Err(ApiError::not_found("Group not found")));
        };
        Ok(Ok((invite, group)))
    })
    .await??;

    Ok(Json(InvitePreviewResponse {
        group_id: group.id,
        group_name: group.name,
        status: invite.status,
        expires_at: invite.expires_at,
    }))
}

pub async fn revoke_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    run_blocking(move || {
        let Some(invite) = db.db.get_invitation_by_token(&token)? else {
            return Ok(Err(ApiError::not_found("Invitation not found")));
        };
        db.db.set_invitation_status(invite.id, "revoked")?;
        Ok(Ok(()))
    })
    .await??;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn accept_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<AcceptInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    let db = state.clone();
    let (group, user) = run_blocking(move || {
        let Some(invite) = db.db.get_invitation_by_token(&token)? else {
            return Ok(Err(ApiError::not_found("Invitation not found")));
        };
        if invite.status != "pending" {
            return Ok(Err(ApiError::bad_request("Invitation is not pending")));
        }
        if is_expired(&invite) {
            return Ok(Err(ApiError::bad_request("Invitation expired")));
        }
        if db.db.get_user_by_email(&email)?.is_some() {
            return Ok(Err(ApiError::bad_request("Email already registered")));
        }
        let Some(group) = db.db.get_group(invite.group_id)? else {
            return Ok(Err(ApiError::not_found("Group not found")));
        };

        let user = db.db.create_user(
            Some(group.id),
            &req.name,
            &email,
            req.phone.as_deref(),
            false,
        )?;
        db.db.set_invitation_status(invite.id, "accepted")?;
        Ok(Ok((group, user)))
    })
    .await??;

    Ok(Json(AcceptInviteResponse {
        group: group_response(group),
        user: user_response(user),
    }))
}

/// Expiry timestamps are stored as SQLite `datetime('now')` text.
fn is_expired(invite: &InvitationRow) -> bool {
    match NaiveDateTime::parse_from_str(&invite.expires_at, "%Y-%m-%d %H:%M:%S") {
        Ok(expires_at) => expires_at < Utc::now().naive_utc(),
        Err(e) => {
            warn!(
                token = %invite.token,
                expires_at = %invite.expires_at,
                "Unparsable invitation expiry: {}",
                e
            );
            false
        }
    }
}

fn invite_response(row: InvitationRow) -> InviteResponse {
    InviteResponse {
        token: row.token,
        email: row.email,
        status: row.status,
        expires_at: row.expires_at,
        created_by_user_id: row.created_by_user_id,
        group_id: row.group_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(expires_at: &str) -> InvitationRow {
        InvitationRow {
            id: 1,
            group_id: 1,
            email: None,
            token: "ABC-DEF".to_string(),
            status: "pending".to_string(),
            expires_at: expires_at.to_string(),
            created_by_user_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn past_expiry_is_expired() {
        assert!(is_expired(&invite("2020-01-01 00:00:00")));
    }

    #[test]
    fn future_expiry_is_not_expired() {
        assert!(!is_expired(&invite("2999-01-01 00:00:00")));
    }

    #[test]
    fn unparsable_expiry_does_not_block_acceptance() {
        assert!(!is_expired(&invite("soon")));
    }
}
