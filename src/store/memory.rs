//! Single-process session store

use super::{SessionStore, StoreError, StoreResult};
use crate::state_machine::{Session, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct Entry {
    session: Session,
    touched: Instant,
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<UserId, Entry>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions().map_or(0, |s| s.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sessions(&self) -> StoreResult<MutexGuard<'_, HashMap<UserId, Entry>>> {
        self.sessions.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, user_id: UserId) -> StoreResult<Option<Session>> {
        Ok(self.sessions()?.get(&user_id).map(|e| e.session))
    }

    async fn save(&self, user_id: UserId, session: &Session) -> StoreResult<()> {
        self.sessions()?.insert(
            user_id,
            Entry {
                session: *session,
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> StoreResult<()> {
        self.sessions()?.remove(&user_id);
        Ok(())
    }

    async fn evict_idle(&self, max_idle: Duration) -> StoreResult<usize> {
        let mut sessions = self.sessions()?;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.touched.elapsed() < max_idle);
        Ok(before - sessions.len())
    }
}
