use serde::{Deserialize, Serialize};

// -- Sync --

/// A note mutation pushed by a device. Identity fields arrive as decimal
/// strings (empty or unparsable means "not resolved yet", see [`crate::ids`]).
#[derive(Debug, Clone, Deserialize)]
pub struct SendNoteRequest {
    /// Client-assigned note identifier; the upsert key.
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    /// Seconds since epoch, assigned by the writing device.
    pub updated_at: i64,
    #[serde(default)]
    pub target_user_id: Option<String>,
    #[serde(default)]
    pub created_by_user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct SendNoteResponse {
    pub event_id: String,
}

/// Current note state joined to one pending event.
#[derive(Debug, Clone, Serialize)]
pub struct NoteSnapshot {
    pub id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    /// The triggering write's timestamp (seconds), not the note row's
    /// latest one — clients advance their watermark from this field.
    pub updated_at: i64,
    pub deleted: bool,
    pub created_by_user_id: String,
    pub target_user_id: String,
    pub group_id: String,
}

#[derive(Debug, Serialize)]
pub struct SyncUpdate {
    pub event_id: String,
    pub note: NoteSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct AckRequest {
    pub event_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub deleted: usize,
}

// -- Groups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    pub group_id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub group_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

// -- Invitations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInviteRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_by_user_id: Option<i64>,
    #[serde(default = "default_invite_expiry_days")]
    pub expires_in_days: i64,
}

fn default_invite_expiry_days() -> i64 {
    2
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub token: String,
    pub email: Option<String>,
    pub status: String,
    pub expires_at: String,
    pub created_by_user_id: Option<i64>,
    pub group_id: i64,
}

#[derive(Debug, Serialize)]
pub struct InvitePreviewResponse {
    pub group_id: i64,
    pub group_name: String,
    pub status: String,
    pub expires_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptInviteRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AcceptInviteResponse {
    pub group: GroupResponse,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_defaults_optional_fields() {
        let req: SendNoteRequest = serde_json::from_str(
            r#"{"id":"note-1","content":"hello","updated_at":1700000000}"#,
        )
        .unwrap();
        assert_eq!(req.id, "note-1");
        assert_eq!(req.title, None);
        assert!(!req.deleted);
        assert_eq!(req.group_id, None);
    }

    #[test]
    fn send_request_keeps_unparsed_identity_strings() {
        let req: SendNoteRequest = serde_json::from_str(
            r#"{"id":"n","content":"x","updated_at":1,"group_id":"","target_user_id":"abc"}"#,
        )
        .unwrap();
        // Coercion to null happens at the handler, not during deserialization.
        assert_eq!(req.group_id.as_deref(), Some(""));
        assert_eq!(req.target_user_id.as_deref(), Some("abc"));
    }

    #[test]
    fn invite_request_defaults_expiry() {
        let req: CreateInviteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.expires_in_days, 2);
        assert_eq!(req.email, None);
    }
}
