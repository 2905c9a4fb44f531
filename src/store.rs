//! Per-user session storage
//!
//! Keyed map semantics with last-write-wins. Every read-modify-write for a
//! given user already runs under that user's exclusion token, so stores do
//! no versioning of their own.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use crate::state_machine::{Session, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Session encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Session store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for conversation sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session, or `None` if the user is idle or the stored record
    /// is unreadable
    async fn load(&self, user_id: UserId) -> StoreResult<Option<Session>>;

    /// Insert or replace the session
    async fn save(&self, user_id: UserId, session: &Session) -> StoreResult<()>;

    /// Return the user to idle
    async fn clear(&self, user_id: UserId) -> StoreResult<()>;

    /// Drop sessions untouched for at least `max_idle`; returns how many
    async fn evict_idle(&self, max_idle: Duration) -> StoreResult<usize>;
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load(&self, user_id: UserId) -> StoreResult<Option<Session>> {
        (**self).load(user_id).await
    }

    async fn save(&self, user_id: UserId, session: &Session) -> StoreResult<()> {
        (**self).save(user_id, session).await
    }

    async fn clear(&self, user_id: UserId) -> StoreResult<()> {
        (**self).clear(user_id).await
    }

    async fn evict_idle(&self, max_idle: Duration) -> StoreResult<usize> {
        (**self).evict_idle(max_idle).await
    }
}
