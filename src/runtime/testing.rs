//! Mock implementations for testing
//!
//! These mocks enable dispatcher tests without a real transport.

use super::traits::{DeliveryError, Messenger};
use crate::script::Payload;
use crate::state_machine::{Action, Session, UserId};
use crate::store::{SessionStore, StoreResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Messenger
// ============================================================================

/// Records every action it is asked to perform
#[derive(Default)]
pub struct MockMessenger {
    sent: Mutex<Vec<(UserId, Action)>>,
    fail_payloads: AtomicBool,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every payload delivery fail from now on
    pub fn fail_payloads(&self) {
        self.fail_payloads.store(true, Ordering::SeqCst);
    }

    pub fn sent_to(&self, user_id: UserId) -> Vec<Action> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, action)| action.clone())
            .collect()
    }

    pub fn payloads(&self) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, action)| matches!(action, Action::SendPayload { .. }))
            .count()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_text(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((user_id, Action::text(text)));
        Ok(())
    }

    async fn send_payload(&self, user_id: UserId, payload: &Payload) -> Result<(), DeliveryError> {
        if self.fail_payloads.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("payload unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((user_id, Action::payload(payload)));
        Ok(())
    }
}

// ============================================================================
// Tracking Store
// ============================================================================

/// Wraps a store and measures how many load-to-save windows overlap
pub struct TrackingStore<S> {
    inner: S,
    /// (currently open windows, most ever open at once)
    windows: Mutex<(usize, usize)>,
}

impl<S> TrackingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            windows: Mutex::new((0, 0)),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.windows.lock().unwrap().1
    }

    fn open(&self) {
        let mut windows = self.windows.lock().unwrap();
        windows.0 += 1;
        windows.1 = windows.1.max(windows.0);
    }

    fn close(&self) {
        let mut windows = self.windows.lock().unwrap();
        windows.0 = windows.0.saturating_sub(1);
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for TrackingStore<S> {
    async fn load(&self, user_id: UserId) -> StoreResult<Option<Session>> {
        self.open();
        let session = self.inner.load(user_id).await;
        // Give any other task for this user a chance to interleave
        tokio::task::yield_now().await;
        session
    }

    async fn save(&self, user_id: UserId, session: &Session) -> StoreResult<()> {
        let saved = self.inner.save(user_id, session).await;
        self.close();
        saved
    }

    async fn clear(&self, user_id: UserId) -> StoreResult<()> {
        let cleared = self.inner.clear(user_id).await;
        self.close();
        cleared
    }

    async fn evict_idle(&self, max_idle: Duration) -> StoreResult<usize> {
        self.inner.evict_idle(max_idle).await
    }
}
