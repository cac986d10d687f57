/// Database row types — these map directly to SQLite rows.
/// Distinct from the notehive-types wire models so the storage layer stays
/// strongly typed while identities cross the HTTP boundary as strings.

#[derive(Debug, Clone)]
pub struct NoteRow {
    /// Server-assigned surrogate key, stable for the note's lifetime.
    pub id: i64,
    /// Client-assigned identifier; the upsert key.
    pub client_id: String,
    pub group_id: Option<i64>,
    pub created_by_user_id: Option<i64>,
    pub source_user_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub deleted: bool,
    /// Seconds since epoch, taken from the incoming write.
    pub updated_at: i64,
}

/// One full-replace write against a note, as resolved at the boundary.
#[derive(Debug, Clone)]
pub struct NoteWrite {
    pub client_id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub deleted: bool,
    pub group_id: Option<i64>,
    pub created_by_user_id: Option<i64>,
    pub source_user_id: Option<i64>,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct SyncEventRow {
    pub id: i64,
    pub note_id: i64,
    pub user_id: Option<i64>,
    pub event_type: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub group_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct InvitationRow {
    pub id: i64,
    pub group_id: i64,
    pub email: Option<String>,
    pub token: String,
    pub status: String,
    pub expires_at: String,
    pub created_by_user_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}
