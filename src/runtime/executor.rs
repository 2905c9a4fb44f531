//! Event dispatcher

use super::traits::Messenger;
use crate::guard::UserLocks;
use crate::script::Script;
use crate::state_machine::{transition, Action, InboundEvent, Outcome, Session, UserId};
use crate::store::{SessionStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session store failed: {0}")]
    Store(#[from] StoreError),
}

/// What one janitor pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub locks: usize,
    pub sessions: usize,
}

/// Generic dispatcher that can work with any store and messenger
pub struct Dispatcher<S, M>
where
    S: SessionStore,
    M: Messenger,
{
    script: Arc<Script>,
    store: S,
    messenger: M,
    locks: UserLocks,
}

impl<S, M> Dispatcher<S, M>
where
    S: SessionStore,
    M: Messenger,
{
    #[must_use]
    pub fn new(script: Arc<Script>, store: S, messenger: M) -> Self {
        Self {
            script,
            store,
            messenger,
            locks: UserLocks::new(),
        }
    }

    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    #[must_use]
    pub fn locks(&self) -> &UserLocks {
        &self.locks
    }

    /// Run one event through the state machine and persist the result.
    ///
    /// The actions are returned for the caller to perform; nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded or persisted.
    pub async fn process(&self, inbound: &InboundEvent) -> Result<Vec<Action>, RuntimeError> {
        self.locks
            .with_user(inbound.user_id, || self.step(inbound))
            .await
    }

    /// Like `process`, but also performs the actions through the messenger
    /// before the user's token is released.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded or persisted.
    /// Delivery failures are logged, not returned.
    pub async fn dispatch(&self, inbound: &InboundEvent) -> Result<Vec<Action>, RuntimeError> {
        self.locks
            .with_user(inbound.user_id, || async {
                let actions = self.step(inbound).await?;
                self.deliver(inbound.user_id, &actions).await;
                Ok(actions)
            })
            .await
    }

    /// One pass of idle eviction over tokens and sessions
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to evict.
    pub async fn sweep(&self, max_idle: Duration) -> Result<SweepStats, RuntimeError> {
        let locks = self.locks.sweep_idle(max_idle);
        let sessions = self.store.evict_idle(max_idle).await?;
        Ok(SweepStats { locks, sessions })
    }

    /// Load, transition, save. Must run under the user's token.
    async fn step(&self, inbound: &InboundEvent) -> Result<Vec<Action>, RuntimeError> {
        let user_id = inbound.user_id;
        let current = self.store.load(user_id).await?;
        let event = inbound.to_event(&self.script);
        let result = transition(current.as_ref(), &self.script, event);

        match &result.session {
            Some(session) => self.store.save(user_id, session).await?,
            // Also drops a stored record that failed to load
            None => self.store.clear(user_id).await?,
        }

        if let Outcome::GateRejected { rule: Some(rule) } = result.outcome {
            tracing::debug!(user_id = %user_id, rule = rule.name(), "Classifier picked reply");
        }
        tracing::info!(
            user_id = %user_id,
            from = %Session::label(current.as_ref()),
            to = %Session::label(result.session.as_ref()),
            outcome = ?result.outcome,
            actions = result.actions.len(),
            "Transition"
        );

        Ok(result.actions)
    }

    async fn deliver(&self, user_id: UserId, actions: &[Action]) {
        for action in actions {
            let sent = match action {
                Action::SendText { text } => self.messenger.send_text(user_id, text).await,
                Action::SendPayload { payload } => {
                    tracing::info!(user_id = %user_id, payload = ?payload, "Delivering payload");
                    self.messenger.send_payload(user_id, payload).await
                }
            };
            if let Err(e) = sent {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to deliver action");
            }
        }
    }
}

impl<S, M> Dispatcher<S, M>
where
    S: SessionStore + 'static,
    M: Messenger + 'static,
{
    /// Start the background task that evicts idle tokens and sessions
    #[must_use]
    pub fn spawn_janitor(self: &Arc<Self>, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match dispatcher.sweep(max_idle).await {
                    Ok(stats) if stats != SweepStats::default() => {
                        tracing::info!(
                            locks = stats.locks,
                            sessions = stats.sessions,
                            "Evicted idle conversations"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Idle sweep failed"),
                }
            }
        })
    }
}
