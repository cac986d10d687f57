//! The sync boundary: send one mutation, fetch pending updates after a
//! watermark, acknowledge applied events.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::warn;

use notehive_db::models::{NoteRow, NoteWrite, SyncEventRow};
use notehive_types::api::{AckRequest, AckResponse, NoteSnapshot, SendNoteRequest, SendNoteResponse, SyncUpdate};
use notehive_types::ids::{fmt_opt_id, parse_opt_id};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

pub async fn send_note(
    State(state): State<AppState>,
    Json(req): Json<SendNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.id.trim().is_empty() {
        return Err(ApiError::bad_request("note id must not be empty"));
    }

    let write = NoteWrite {
        client_id: req.id,
        title: req.title,
        content: Some(req.content),
        deleted: req.deleted,
        group_id: parse_opt_id(req.group_id.as_deref()),
        created_by_user_id: parse_opt_id(req.created_by_user_id.as_deref()),
        source_user_id: parse_opt_id(req.target_user_id.as_deref()),
        updated_at: req.updated_at,
    };

    let db = state.clone();
    let event_id = run_blocking(move || db.db.send(&write)).await?;

    Ok((
        StatusCode::CREATED,
        Json(SendNoteResponse {
            event_id: event_id.to_string(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdatesQuery {
    /// Exclusive watermark, UNIX seconds; fractional values accepted.
    pub since: f64,
}

pub async fn get_updates(
    State(state): State<AppState>,
    Query(query): Query<UpdatesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let pairs = run_blocking(move || db.db.fetch_updates(query.since)).await?;

    let updates: Vec<SyncUpdate> = pairs
        .into_iter()
        .map(|(event, note)| snapshot(&event, note))
        .collect();

    Ok(Json(updates))
}

pub async fn acknowledge(
    State(state): State<AppState>,
    Json(req): Json<AckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = parse_event_ids(&req.event_ids);

    let db = state.clone();
    let deleted = run_blocking(move || db.db.acknowledge(&ids)).await?;

    Ok(Json(AckResponse { deleted }))
}

/// Event identifiers arrive as strings; tokens that do not parse are dropped
/// with a warning rather than failing the whole batch.
fn parse_event_ids(raw: &[String]) -> Vec<i64> {
    raw.iter()
        .filter_map(|token| match token.trim().parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(token = %token, "Ignoring malformed ack event id");
                None
            }
        })
        .collect()
}

/// Wire view of one pending event: identity from the event, content from the
/// note's current state, timestamp from the triggering write so clients can
/// advance their watermark event by event.
fn snapshot(event: &SyncEventRow, note: NoteRow) -> SyncUpdate {
    SyncUpdate {
        event_id: event.id.to_string(),
        note: NoteSnapshot {
            id: note.client_id,
            title: note.title,
            content: note.content,
            updated_at: event.updated_at,
            deleted: note.deleted,
            created_by_user_id: fmt_opt_id(note.created_by_user_id),
            target_user_id: fmt_opt_id(note.source_user_id),
            group_id: fmt_opt_id(note.group_id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_event_ids_are_dropped() {
        let raw = vec![
            "not-a-number".to_string(),
            String::new(),
            "17".to_string(),
            " 23 ".to_string(),
        ];
        assert_eq!(parse_event_ids(&raw), vec![17, 23]);
        assert!(parse_event_ids(&[]).is_empty());
    }

    #[test]
    fn snapshot_formats_identities_as_strings() {
        let event = SyncEventRow {
            id: 7,
            note_id: 3,
            user_id: Some(2),
            event_type: "note".to_string(),
            updated_at: 100,
        };
        let note = NoteRow {
            id: 3,
            client_id: "n-1".to_string(),
            group_id: Some(5),
            created_by_user_id: None,
            source_user_id: Some(2),
            title: None,
            content: Some("current".to_string()),
            deleted: false,
            updated_at: 250,
        };

        let update = snapshot(&event, note);
        assert_eq!(update.event_id, "7");
        assert_eq!(update.note.id, "n-1");
        assert_eq!(update.note.group_id, "5");
        assert_eq!(update.note.created_by_user_id, "");
        assert_eq!(update.note.target_user_id, "2");
        // Content is current state, timestamp is the event's.
        assert_eq!(update.note.content.as_deref(), Some("current"));
        assert_eq!(update.note.updated_at, 100);
    }
}
