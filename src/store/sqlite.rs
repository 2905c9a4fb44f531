//! `SQLite`-backed session store
//!
//! Sessions survive restarts of the process. Each row holds the JSON
//! encoding of a `Session` and the time it was last written.

use super::{SessionStore, StoreError, StoreResult};
use crate::state_machine::{Session, UserId};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    user_id INTEGER PRIMARY KEY,
    session TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_updated ON sessions(updated_at);
";

/// Fixed-width UTC timestamps so that text comparison orders by time
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Thread-safe database handle
#[derive(Clone)]
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Open or create the database at the given path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot
    /// be created.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn save_at(&self, user_id: UserId, session: &Session, at: DateTime<Utc>) -> StoreResult<()> {
        let json = serde_json::to_string(session)?;
        self.conn()?.execute(
            "INSERT INTO sessions (user_id, session, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET session = excluded.session, updated_at = excluded.updated_at",
            params![user_id.0, json, timestamp(at)],
        )?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, user_id: UserId) -> StoreResult<Option<Session>> {
        let json: Option<String> = self
            .conn()?
            .query_row(
                "SELECT session FROM sessions WHERE user_id = ?1",
                params![user_id.0],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.and_then(|json| match serde_json::from_str(&json) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Discarding unreadable session");
                None
            }
        }))
    }

    async fn save(&self, user_id: UserId, session: &Session) -> StoreResult<()> {
        self.save_at(user_id, session, Utc::now())
    }

    async fn clear(&self, user_id: UserId) -> StoreResult<()> {
        self.conn()?
            .execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id.0])?;
        Ok(())
    }

    async fn evict_idle(&self, max_idle: Duration) -> StoreResult<usize> {
        // A window too large to represent can never be exceeded
        let Some(cutoff) = TimeDelta::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle))
        else {
            return Ok(0);
        };
        let removed = self.conn()?.execute(
            "DELETE FROM sessions WHERE updated_at <= ?1",
            params![timestamp(cutoff)],
        )?;
        Ok(removed)
    }
}
