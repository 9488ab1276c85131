//! Database schema migrations for focusly.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::warn;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub(crate) fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: focus sessions and the key-value store.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS focus_sessions (
            id                  TEXT PRIMARY KEY,
            date                TEXT NOT NULL,
            duration_secs       INTEGER NOT NULL,
            break_duration_secs INTEGER NOT NULL,
            cycles_completed    INTEGER NOT NULL,
            was_completed       INTEGER NOT NULL,
            task_label          TEXT
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_focus_sessions_date ON focus_sessions(date);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: session journal notes.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS session_notes (
            id               TEXT PRIMARY KEY,
            date             TEXT NOT NULL,
            session_duration INTEGER NOT NULL,
            cycles_completed INTEGER NOT NULL,
            note             TEXT NOT NULL DEFAULT '',
            mood             TEXT,
            tags             TEXT NOT NULL DEFAULT '[]',
            task_completed   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_session_notes_date ON session_notes(date);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: tasks.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id                   TEXT PRIMARY KEY,
            title                TEXT NOT NULL,
            is_completed         INTEGER NOT NULL DEFAULT 0,
            priority             INTEGER NOT NULL DEFAULT 1,
            estimated_pomodoros  INTEGER NOT NULL DEFAULT 1,
            completed_pomodoros  INTEGER NOT NULL DEFAULT 0,
            due_date             TEXT,
            notes                TEXT,
            created_at           TEXT NOT NULL,
            completed_at         TEXT,
            tags                 TEXT NOT NULL DEFAULT '[]',
            position             INTEGER NOT NULL DEFAULT 0
        );",
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}
