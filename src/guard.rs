//! Per-user mutual exclusion
//!
//! Every inbound event runs its whole load, transition, save and send cycle
//! while holding its user's token. Tokens are created lazily and dropped
//! again by `sweep_idle` once nobody holds or waits for them.

use crate::state_machine::UserId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

struct LockEntry {
    lock: Arc<AsyncMutex<()>>,
    last_used: Instant,
}

/// Registry of per-user exclusion tokens
#[derive(Default)]
pub struct UserLocks {
    entries: Mutex<HashMap<UserId, LockEntry>>,
}

impl UserLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` while holding the token for `user_id`.
    ///
    /// The token is released on every exit path: normal return, panic
    /// unwinding, or the returned future being dropped.
    pub async fn with_user<F, Fut, T>(&self, user_id: UserId, action: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = self.token(user_id);
        let _held = lock.lock_owned().await;
        action().await
    }

    /// Remove tokens that are neither held nor awaited and were last handed
    /// out at least `max_idle` ago; returns how many were removed
    #[must_use]
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        // The registry's own Arc is the only reference left when no task
        // holds or waits on the token. Clones are only made under this
        // mutex, so the count cannot grow while we look at it.
        entries.retain(|_, entry| {
            Arc::strong_count(&entry.lock) > 1 || entry.last_used.elapsed() < max_idle
        });
        before - entries.len()
    }

    /// Number of tokens currently registered
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn token(&self, user_id: UserId) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries();
        let entry = entries.entry(user_id).or_insert_with(|| LockEntry {
            lock: Arc::new(AsyncMutex::new(())),
            last_used: Instant::now(),
        });
        entry.last_used = Instant::now();
        Arc::clone(&entry.lock)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<UserId, LockEntry>> {
        // The map is consistent at every await-free step, so poisoning is harmless
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
