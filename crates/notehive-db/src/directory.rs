//! Directory queries: groups, users and invitations. Conventional CRUD that
//! the sync core consumes as its identity model.

use anyhow::{Result, anyhow};
use chrono::Utc;
use rand::Rng;
use rusqlite::{Connection, params};

use crate::Database;
use crate::models::{GroupRow, InvitationRow, UserRow};
use crate::notes::OptionalExt;

const HEX_UPPER: &[u8] = b"0123456789ABCDEF";

/// Short human-typable invitation token, `XXX-XXX` over uppercase hex.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let raw: String = (0..6)
        .map(|_| HEX_UPPER[rng.random_range(0..HEX_UPPER.len())] as char)
        .collect();
    format!("{}-{}", &raw[..3], &raw[3..])
}

fn sql_datetime(ts: chrono::DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl Database {
    // -- Groups --

    pub fn create_group(&self, name: &str, description: Option<&str>) -> Result<GroupRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO groups (name, description) VALUES (?1, ?2)",
                params![name, description],
            )?;
            let id = conn.last_insert_rowid();
            query_group(conn, id)?.ok_or_else(|| anyhow!("Group {} not found after insert", id))
        })
    }

    pub fn get_group(&self, id: i64) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| query_group(conn, id))
    }

    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, created_at, updated_at
                 FROM groups ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map([], parse_group)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Users --

    pub fn create_user(
        &self,
        group_id: Option<i64>,
        name: &str,
        email: &str,
        phone: Option<&str>,
        is_admin: bool,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (group_id, name, email, phone, is_admin)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![group_id, name, email, phone, is_admin as i64],
            )?;
            let id = conn.last_insert_rowid();
            query_user(conn, id)?.ok_or_else(|| anyhow!("User {} not found after insert", id))
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, group_id, name, email, phone, is_admin, created_at, updated_at
                 FROM users WHERE email = ?1",
            )?;
            let row = stmt.query_row(params![email], parse_user).optional()?;
            Ok(row)
        })
    }

    pub fn list_users_by_group(&self, group_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, group_id, name, email, phone, is_admin, created_at, updated_at
                 FROM users WHERE group_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map(params![group_id], parse_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Full-field update; callers merge partial changes first. Returns the
    /// refreshed row, or `None` if the user does not exist.
    pub fn update_user(
        &self,
        id: i64,
        name: &str,
        email: &str,
        phone: Option<&str>,
        is_admin: bool,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET name = ?1, email = ?2, phone = ?3, is_admin = ?4,
                     updated_at = datetime('now')
                 WHERE id = ?5",
                params![name, email, phone, is_admin as i64, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, id)
        })
    }

    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
    }

    // -- Invitations --

    pub fn create_invitation(
        &self,
        group_id: i64,
        email: Option<&str>,
        created_by_user_id: Option<i64>,
        expires_in_days: i64,
    ) -> Result<InvitationRow> {
        let token = generate_token();
        let expires_at = sql_datetime(Utc::now() + chrono::Duration::days(expires_in_days.max(1)));

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO group_invitations
                     (group_id, email, token, status, expires_at, created_by_user_id)
                 VALUES (?1, ?2, ?3, 'pending', ?4, ?5)",
                params![group_id, email, token, expires_at, created_by_user_id],
            )?;
            let id = conn.last_insert_rowid();
            query_invitation(conn, id)?
                .ok_or_else(|| anyhow!("Invitation {} not found after insert", id))
        })
    }

    pub fn list_invitations(&self, group_id: i64) -> Result<Vec<InvitationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, group_id, email, token, status, expires_at,
                        created_by_user_id, created_at, updated_at
                 FROM group_invitations
                 WHERE group_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map(params![group_id], parse_invitation)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Tokens are case-insensitive on lookup; they are stored uppercase.
    pub fn get_invitation_by_token(&self, token: &str) -> Result<Option<InvitationRow>> {
        let token = token.to_uppercase();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, group_id, email, token, status, expires_at,
                        created_by_user_id, created_at, updated_at
                 FROM group_invitations WHERE token = ?1",
            )?;
            let row = stmt.query_row(params![token], parse_invitation).optional()?;
            Ok(row)
        })
    }

    pub fn set_invitation_status(&self, id: i64, status: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE group_invitations
                 SET status = ?1, updated_at = datetime('now')
                 WHERE id = ?2",
                params![status, id],
            )?;
            Ok(())
        })
    }

    // -- Admin --

    /// Wipe all application data. Order matters due to foreign keys.
    pub fn reset_all(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute_batch(
                "DELETE FROM sync_events;
                 DELETE FROM notes;
                 DELETE FROM group_invitations;
                 DELETE FROM users;
                 DELETE FROM groups;",
            )?;
            Ok(())
        })
    }
}

fn query_group(conn: &Connection, id: i64) -> Result<Option<GroupRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, created_at, updated_at FROM groups WHERE id = ?1",
    )?;
    let row = stmt.query_row(params![id], parse_group).optional()?;
    Ok(row)
}

fn query_user(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, group_id, name, email, phone, is_admin, created_at, updated_at
         FROM users WHERE id = ?1",
    )?;
    let row = stmt.query_row(params![id], parse_user).optional()?;
    Ok(row)
}

fn query_invitation(conn: &Connection, id: i64) -> Result<Option<InvitationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, group_id, email, token, status, expires_at,
                created_by_user_id, created_at, updated_at
         FROM group_invitations WHERE id = ?1",
    )?;
    let row = stmt.query_row(params![id], parse_invitation).optional()?;
    Ok(row)
}

fn parse_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn parse_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        is_admin: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn parse_invitation(row: &rusqlite::Row<'_>) -> rusqlite::Result<InvitationRow> {
    Ok(InvitationRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        email: row.get(2)?,
        token: row.get(3)?,
        status: row.get(4)?,
        expires_at: row.get(5)?,
        created_by_user_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_and_user_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let group = db.create_group("Família", Some("home notes")).unwrap();
        assert_eq!(group.name, "Família");

        let user = db
            .create_user(Some(group.id), "Ana", "ana@example.com", None, true)
            .unwrap();
        assert!(user.is_admin);

        let by_email = db.get_user_by_email("ana@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let members = db.list_users_by_group(group.id).unwrap();
        assert_eq!(members.len(), 1);

        let updated = db
            .update_user(user.id, "Ana Maria", "ana@example.com", Some("+55 11 9"), false)
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert!(!updated.is_admin);

        assert!(db.delete_user(user.id).unwrap());
        assert!(!db.delete_user(user.id).unwrap());
    }

    #[test]
    fn update_missing_user_returns_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.update_user(404, "x", "x@x", None, false).unwrap().is_none());
    }

    #[test]
    fn invitation_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let group = db.create_group("Equipe", None).unwrap();

        let invite = db
            .create_invitation(group.id, Some("bob@example.com"), None, 2)
            .unwrap();
        assert_eq!(invite.status, "pending");
        assert_eq!(invite.token.len(), 7);
        assert_eq!(&invite.token[3..4], "-");

        // Case-insensitive token lookup.
        let found = db
            .get_invitation_by_token(&invite.token.to_lowercase())
            .unwrap()
            .unwrap();
        assert_eq!(found.id, invite.id);

        db.set_invitation_status(invite.id, "accepted").unwrap();
        let accepted = db.get_invitation_by_token(&invite.token).unwrap().unwrap();
        assert_eq!(accepted.status, "accepted");

        let listed = db.list_invitations(group.id).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn invitation_expiry_is_clamped_to_at_least_one_day() {
        let db = Database::open_in_memory().unwrap();
        let group = db.create_group("g", None).unwrap();
        let invite = db.create_invitation(group.id, None, None, 0).unwrap();

        let now = sql_datetime(Utc::now());
        assert!(invite.expires_at > now);
    }

    #[test]
    fn reset_all_empties_every_table() {
        let db = Database::open_in_memory().unwrap();
        let group = db.create_group("g", None).unwrap();
        db.create_user(Some(group.id), "u", "u@example.com", None, false)
            .unwrap();
        db.create_invitation(group.id, None, None, 2).unwrap();

        db.reset_all().unwrap();
        assert!(db.list_groups().unwrap().is_empty());
        assert!(db.get_user_by_email("u@example.com").unwrap().is_none());
    }
}
