//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Logged focus sessions
//! - Session journal notes
//! - Tasks
//! - Key-value store for JSON blobs (custom presets, activity counters, ...)

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{data_dir, migrations};
use crate::error::DatabaseError;
use crate::journal::{Mood, SessionNote};
use crate::stats::FocusSession;
use crate::task::{Priority, Task};

/// SQLite database shared by the managers.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/focusly/focusly.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> crate::Result<Self> {
        let path = data_dir()?.join("focusly.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Focus sessions ───────────────────────────────────────────────

    pub fn insert_focus_session(&self, session: &FocusSession) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO focus_sessions
                (id, date, duration_secs, break_duration_secs, cycles_completed, was_completed, task_label)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id.to_string(),
                session.date.to_rfc3339(),
                session.duration_secs,
                session.break_duration_secs,
                session.cycles_completed,
                session.was_completed,
                session.task_label,
            ],
        )?;
        Ok(())
    }

    /// All sessions, most recent first.
    pub fn list_focus_sessions(&self) -> Result<Vec<FocusSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, duration_secs, break_duration_secs, cycles_completed, was_completed, task_label
             FROM focus_sessions
             ORDER BY date DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FocusSession {
                id: uuid_column(row, 0)?,
                date: timestamp_column(row, 1)?,
                duration_secs: row.get(2)?,
                break_duration_secs: row.get(3)?,
                cycles_completed: row.get(4)?,
                was_completed: row.get(5)?,
                task_label: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn clear_focus_sessions(&self) -> Result<usize, DatabaseError> {
        Ok(self.conn.execute("DELETE FROM focus_sessions", [])?)
    }

    // ── Journal ──────────────────────────────────────────────────────

    pub fn upsert_note(&self, note: &SessionNote) -> Result<(), DatabaseError> {
        let tags = serde_json::to_string(&note.tags).map_err(|e| DatabaseError::CorruptRow {
            table: "session_notes",
            message: e.to_string(),
        })?;
        self.conn.execute(
            "INSERT OR REPLACE INTO session_notes
                (id, date, session_duration, cycles_completed, note, mood, tags, task_completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                note.id.to_string(),
                note.date.to_rfc3339(),
                note.session_duration_secs,
                note.cycles_completed,
                note.note,
                note.mood.map(|m| m.emoji()),
                tags,
                note.task_completed,
            ],
        )?;
        Ok(())
    }

    pub fn delete_note(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let n = self
            .conn
            .execute("DELETE FROM session_notes WHERE id = ?1", [id.to_string()])?;
        Ok(n > 0)
    }

    /// All notes, most recent first.
    pub fn list_notes(&self) -> Result<Vec<SessionNote>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, session_duration, cycles_completed, note, mood, tags, task_completed
             FROM session_notes
             ORDER BY date DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let mood: Option<String> = row.get(5)?;
            Ok(SessionNote {
                id: uuid_column(row, 0)?,
                date: timestamp_column(row, 1)?,
                session_duration_secs: row.get(2)?,
                cycles_completed: row.get(3)?,
                note: row.get(4)?,
                mood: mood.and_then(|m| m.parse::<Mood>().ok()),
                tags: json_column(row, 6)?,
                task_completed: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Replace the stored task list, keeping the given order.
    pub fn replace_tasks(&self, tasks: &[Task]) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM tasks", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tasks
                    (id, title, is_completed, priority, estimated_pomodoros, completed_pomodoros,
                     due_date, notes, created_at, completed_at, tags, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for (position, task) in tasks.iter().enumerate() {
                let tags = serde_json::to_string(&task.tags).map_err(|e| {
                    DatabaseError::CorruptRow {
                        table: "tasks",
                        message: e.to_string(),
                    }
                })?;
                stmt.execute(params![
                    task.id.to_string(),
                    task.title,
                    task.is_completed,
                    task.priority as u8,
                    task.estimated_pomodoros,
                    task.completed_pomodoros,
                    task.due_date.map(|d| d.to_rfc3339()),
                    task.notes,
                    task.created_at.to_rfc3339(),
                    task.completed_at.map(|d| d.to_rfc3339()),
                    tags,
                    position as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, is_completed, priority, estimated_pomodoros, completed_pomodoros,
                    due_date, notes, created_at, completed_at, tags
             FROM tasks
             ORDER BY position ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Task {
                id: uuid_column(row, 0)?,
                title: row.get(1)?,
                is_completed: row.get(2)?,
                priority: Priority::from_level(row.get(3)?),
                estimated_pomodoros: row.get(4)?,
                completed_pomodoros: row.get(5)?,
                due_date: optional_timestamp_column(row, 6)?,
                notes: row.get(7)?,
                created_at: timestamp_column(row, 8)?,
                completed_at: optional_timestamp_column(row, 9)?,
                tags: json_column(row, 10)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Deserialize a JSON blob from the kv store.
    pub fn kv_get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, DatabaseError> {
        match self.kv_get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DatabaseError::CorruptRow {
                    table: "kv",
                    message: format!("{key}: {e}"),
                }),
            None => Ok(None),
        }
    }

    pub fn kv_set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value).map_err(|e| DatabaseError::CorruptRow {
            table: "kv",
            message: format!("{key}: {e}"),
        })?;
        self.kv_set(key, &raw)
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn optional_timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}
