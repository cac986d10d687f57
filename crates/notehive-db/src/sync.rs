//! Sync Coordinator: the three client-facing operations, composed from the
//! note store and the event log.

use anyhow::Result;

use crate::Database;
use crate::events;
use crate::models::{NoteRow, NoteWrite, SyncEventRow};
use crate::notes;

impl Database {
    /// Ingest one note mutation: upsert the note, append one event carrying
    /// the same timestamp. Both writes run in a single transaction so a
    /// failed append can never leave a note without its event.
    pub fn send(&self, write: &NoteWrite) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let note = notes::upsert(&tx, write)?;
            let event_id = events::append(&tx, note.id, write.source_user_id, write.updated_at)?;
            tx.commit()?;
            Ok(event_id)
        })
    }

    /// Events strictly after `since`, joined with current note state.
    pub fn fetch_updates(&self, since: f64) -> Result<Vec<(SyncEventRow, NoteRow)>> {
        self.with_conn(|conn| events::fetch_since(conn, since))
    }

    /// Hard-delete acknowledged events, returning the number actually
    /// removed. An empty batch short-circuits without touching storage.
    pub fn acknowledge(&self, event_ids: &[i64]) -> Result<usize> {
        if event_ids.is_empty() {
            return Ok(0);
        }
        self.with_conn(|conn| events::delete(conn, event_ids))
    }
}
