//! Note Store: durable mapping from a client-assigned note id to its latest
//! known state. Free functions over `&Connection` so the sync coordinator
//! can compose them with the event log inside one transaction.

use anyhow::Result;
use rusqlite::{Connection, params};

use crate::models::{NoteRow, NoteWrite};

/// Insert or fully replace the note identified by `write.client_id`.
///
/// Last-writer-wins: every mutable field is overwritten with the supplied
/// values and `updated_at` is the incoming write's timestamp, never current
/// time. The surrogate key is stable across repeated writes of the same
/// `client_id`.
pub fn upsert(conn: &Connection, write: &NoteWrite) -> Result<NoteRow> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM notes WHERE client_id = ?1",
            params![write.client_id],
            |row| row.get(0),
        )
        .optional()?;

    let id = match existing {
        Some(id) => {
            conn.execute(
                "UPDATE notes
                 SET group_id = ?1, created_by_user_id = ?2, source_user_id = ?3,
                     title = ?4, content = ?5, deleted = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    write.group_id,
                    write.created_by_user_id,
                    write.source_user_id,
                    write.title,
                    write.content,
                    write.deleted as i64,
                    write.updated_at,
                    id
                ],
            )?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO notes
                     (client_id, group_id, created_by_user_id, source_user_id,
                      title, content, deleted, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    write.client_id,
                    write.group_id,
                    write.created_by_user_id,
                    write.source_user_id,
                    write.title,
                    write.content,
                    write.deleted as i64,
                    write.updated_at
                ],
            )?;
            conn.last_insert_rowid()
        }
    };

    get(conn, id)?.ok_or_else(|| anyhow::anyhow!("Note {} vanished during upsert", id))
}

pub fn get(conn: &Connection, note_id: i64) -> Result<Option<NoteRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, group_id, created_by_user_id, source_user_id,
                title, content, deleted, updated_at
         FROM notes WHERE id = ?1",
    )?;

    let row = stmt.query_row(params![note_id], parse_note).optional()?;
    Ok(row)
}

pub fn get_by_client_id(conn: &Connection, client_id: &str) -> Result<Option<NoteRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, group_id, created_by_user_id, source_user_id,
                title, content, deleted, updated_at
         FROM notes WHERE client_id = ?1",
    )?;

    let row = stmt.query_row(params![client_id], parse_note).optional()?;
    Ok(row)
}

fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        group_id: row.get(2)?,
        created_by_user_id: row.get(3)?,
        source_user_id: row.get(4)?,
        title: row.get(5)?,
        content: row.get(6)?,
        deleted: row.get::<_, i64>(7)? != 0,
        updated_at: row.get(8)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
