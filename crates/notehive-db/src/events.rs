//! Event Log: append-only journal of note mutations. Entries record *that* a
//! note changed, by whom and when; current content always comes from the
//! note store at fetch time. Events live until a client acknowledges them.

use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::warn;

use crate::models::{NoteRow, SyncEventRow};
use crate::notes::OptionalExt;

pub const EVENT_TYPE_NOTE: &str = "note";

/// Append one event for a note write. Never deduplicates; every successful
/// send produces exactly one row. Returns the generated event id, at which
/// point the event is visible to fetchers.
pub fn append(conn: &Connection, note_id: i64, user_id: Option<i64>, updated_at: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO sync_events (note_id, user_id, event_type, updated_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![note_id, user_id, EVENT_TYPE_NOTE, updated_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All events strictly after `watermark`, ascending by timestamp, each joined
/// with the *current* state of its note. Events whose note cannot be joined
/// are dropped from the result, never surfaced as an error.
pub fn fetch_since(conn: &Connection, watermark: f64) -> Result<Vec<(SyncEventRow, NoteRow)>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.note_id, e.user_id, e.event_type, e.updated_at,
                n.id, n.client_id, n.group_id, n.created_by_user_id, n.source_user_id,
                n.title, n.content, n.deleted, n.updated_at
         FROM sync_events e
         LEFT JOIN notes n ON n.id = e.note_id
         WHERE e.updated_at > ?1
         ORDER BY e.updated_at ASC",
    )?;

    let rows = stmt
        .query_map(params![watermark], |row| {
            let event = SyncEventRow {
                id: row.get(0)?,
                note_id: row.get(1)?,
                user_id: row.get(2)?,
                event_type: row.get(3)?,
                updated_at: row.get(4)?,
            };
            // Unjoinable note: every n.* column is NULL.
            let note = match row.get::<_, Option<i64>>(5)? {
                Some(_) => Some(parse_note_offset(row)?),
                None => None,
            };
            Ok((event, note))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let pairs = rows
        .into_iter()
        .filter_map(|(event, note)| match note {
            Some(note) => Some((event, note)),
            None => {
                warn!(
                    event_id = event.id,
                    note_id = event.note_id,
                    "Dropping sync event with no matching note"
                );
                None
            }
        })
        .collect();

    Ok(pairs)
}

fn parse_note_offset(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(5)?,
        client_id: row.get(6)?,
        group_id: row.get(7)?,
        created_by_user_id: row.get(8)?,
        source_user_id: row.get(9)?,
        title: row.get(10)?,
        content: row.get(11)?,
        deleted: row.get::<_, i64>(12)? != 0,
        updated_at: row.get(13)?,
    })
}

/// Hard-delete acknowledged events. Ids that no longer exist are no-ops and
/// contribute zero to the returned count.
pub fn delete(conn: &Connection, event_ids: &[i64]) -> Result<usize> {
    if event_ids.is_empty() {
        return Ok(0);
    }

    let placeholders: Vec<String> = (1..=event_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "DELETE FROM sync_events WHERE id IN ({})",
        placeholders.join(", ")
    );

    let params: Vec<&dyn rusqlite::types::ToSql> = event_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let removed = conn.execute(&sql, params.as_slice())?;
    Ok(removed)
}

/// Look up a single event; used by tests and diagnostics.
pub fn get(conn: &Connection, event_id: i64) -> Result<Option<SyncEventRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, note_id, user_id, event_type, updated_at
         FROM sync_events WHERE id = ?1",
    )?;

    let row = stmt
        .query_row(params![event_id], |row| {
            Ok(SyncEventRow {
                id: row.get(0)?,
                note_id: row.get(1)?,
                user_id: row.get(2)?,
                event_type: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::models::NoteWrite;
    use crate::notes;

    fn seed_note(conn: &Connection, client_id: &str, content: &str, ts: i64) -> NoteRow {
        notes::upsert(
            conn,
            &NoteWrite {
                client_id: client_id.to_string(),
                title: None,
                content: Some(content.to_string()),
                deleted: false,
                group_id: None,
                created_by_user_id: None,
                source_user_id: None,
                updated_at: ts,
            },
        )
        .unwrap()
    }

    #[test]
    fn append_always_inserts_a_fresh_row() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let note = seed_note(conn, "n-1", "a", 10);
            let e1 = append(conn, note.id, Some(1), 10).unwrap();
            let e2 = append(conn, note.id, Some(1), 10).unwrap();
            assert_ne!(e1, e2);

            let stored = get(conn, e1).unwrap().unwrap();
            assert_eq!(stored.event_type, EVENT_TYPE_NOTE);
            assert_eq!(stored.updated_at, 10);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn fetch_since_is_exclusive_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let a = seed_note(conn, "n-a", "a", 100);
            let b = seed_note(conn, "n-b", "b", 200);
            let ea = append(conn, a.id, None, 100).unwrap();
            let eb = append(conn, b.id, None, 200).unwrap();

            // since == A's timestamp: A excluded, B included.
            let pairs = fetch_since(conn, 100.0).unwrap();
            assert_eq!(pairs.len(), 1);
            assert_eq!(pairs[0].0.id, eb);

            // Idempotent read: same watermark, same result.
            let again = fetch_since(conn, 100.0).unwrap();
            assert_eq!(again.len(), 1);
            assert_eq!(again[0].0.id, eb);

            let all = fetch_since(conn, 0.0).unwrap();
            assert_eq!(all.iter().map(|(e, _)| e.id).collect::<Vec<_>>(), vec![ea, eb]);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn fetch_since_accepts_fractional_watermarks() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let note = seed_note(conn, "n-f", "x", 100);
            append(conn, note.id, None, 100).unwrap();

            assert_eq!(fetch_since(conn, 99.5).unwrap().len(), 1);
            assert_eq!(fetch_since(conn, 100.5).unwrap().len(), 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn unjoinable_events_are_skipped_not_errored() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn_mut(|conn| {
            let kept = seed_note(conn, "n-kept", "k", 10);
            let doomed = seed_note(conn, "n-doomed", "d", 20);
            append(conn, kept.id, None, 10).unwrap();
            append(conn, doomed.id, None, 20).unwrap();

            // Physical note deletion is outside the model; simulate it to
            // exercise the defensive join path.
            conn.pragma_update(None, "foreign_keys", "OFF").unwrap();
            conn.execute("DELETE FROM notes WHERE id = ?1", params![doomed.id])
                .unwrap();

            let pairs = fetch_since(conn, 0.0).unwrap();
            assert_eq!(pairs.len(), 1);
            assert_eq!(pairs[0].1.client_id, "n-kept");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn delete_counts_only_existing_rows() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let note = seed_note(conn, "n-d", "x", 1);
            let e1 = append(conn, note.id, None, 1).unwrap();
            let e2 = append(conn, note.id, None, 2).unwrap();

            assert_eq!(delete(conn, &[e1, 999_999]).unwrap(), 1);
            // Already deleted: no-op.
            assert_eq!(delete(conn, &[e1]).unwrap(), 0);
            assert_eq!(delete(conn, &[e2]).unwrap(), 1);
            assert_eq!(delete(conn, &[]).unwrap(), 0);
            Ok(())
        })
        .unwrap();
    }
}
