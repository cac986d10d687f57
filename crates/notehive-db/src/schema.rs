use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn create_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS groups (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            description TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id    INTEGER REFERENCES groups(id) ON DELETE CASCADE,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            phone       TEXT,
            is_admin    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS group_invitations (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id            INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            email               TEXT,
            token               TEXT NOT NULL UNIQUE,
            status              TEXT NOT NULL DEFAULT 'pending',
            expires_at          TEXT,
            created_by_user_id  INTEGER REFERENCES users(id) ON DELETE SET NULL,
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Notes are tombstoned (deleted = 1), never physically removed, so
        -- deletion propagates through the event log like any other write.
        CREATE TABLE IF NOT EXISTS notes (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id           TEXT NOT NULL UNIQUE,
            group_id            INTEGER REFERENCES groups(id) ON DELETE CASCADE,
            created_by_user_id  INTEGER REFERENCES users(id) ON DELETE SET NULL,
            source_user_id      INTEGER REFERENCES users(id) ON DELETE SET NULL,
            title               TEXT,
            content             TEXT,
            deleted             INTEGER NOT NULL DEFAULT 0,
            updated_at          INTEGER NOT NULL
        );

        -- updated_at carries the triggering write's timestamp (seconds),
        -- not insertion time; fetch order and watermarks depend on it.
        CREATE TABLE IF NOT EXISTS sync_events (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            note_id     INTEGER NOT NULL REFERENCES notes(id),
            user_id     INTEGER,
            event_type  TEXT NOT NULL DEFAULT 'note',
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sync_events_updated
            ON sync_events(updated_at);

        CREATE INDEX IF NOT EXISTS idx_notes_group
            ON notes(group_id);
        ",
    )?;

    info!("Database schema ready");
    Ok(())
}
