//! Line-oriented JSON transport over stdin/stdout
//!
//! Each input line is one inbound event, e.g. `{"user_id": 42, "text": "hi"}`
//! (omit `text` for a non-text message). Each output line is one performed
//! action tagged with the user it was sent to.

use crate::runtime::{DeliveryError, Dispatcher, Messenger};
use crate::script::Payload;
use crate::state_machine::{Action, InboundEvent, UserId};
use crate::store::SessionStore;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Serialize)]
struct OutboundLine<'a> {
    user_id: UserId,
    #[serde(flatten)]
    action: &'a Action,
}

/// Messenger that writes one JSON line per action
pub struct ConsoleMessenger<W> {
    out: Mutex<W>,
}

impl ConsoleMessenger<tokio::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleMessenger<W>
where
    W: AsyncWrite + Unpin + Send,
{
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write(&self, user_id: UserId, action: &Action) -> Result<(), DeliveryError> {
        let mut line = serde_json::to_vec(&OutboundLine { user_id, action })
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        line.push(b'\n');
        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<W> Messenger for ConsoleMessenger<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_text(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        self.write(user_id, &Action::text(text)).await
    }

    async fn send_payload(&self, user_id: UserId, payload: &Payload) -> Result<(), DeliveryError> {
        if let Payload::File { path } = payload {
            let available = tokio::fs::metadata(path)
                .await
                .as_ref()
                .is_ok_and(std::fs::Metadata::is_file);
            if !available {
                tracing::warn!(user_id = %user_id, path = %path.display(), "Payload file missing");
                let name = path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                return self
                    .send_text(user_id, &format!("Payload not found: {name}"))
                    .await;
            }
        }
        self.write(user_id, &Action::payload(payload)).await
    }
}

/// Feed every line of `input` through the dispatcher until EOF; returns the
/// number of events handled.
///
/// Each event runs in its own task, so users proceed independently. A new
/// event waits for the previous task of the same user, which keeps one
/// user's events in input order.
///
/// # Errors
///
/// Returns an error if reading `input` fails. Malformed lines and failed
/// events are logged and skipped.
pub async fn run<S, M, R>(dispatcher: &Arc<Dispatcher<S, M>>, input: R) -> std::io::Result<usize>
where
    S: SessionStore + 'static,
    M: Messenger + 'static,
    R: AsyncBufRead + Unpin,
{
    let handled = Arc::new(AtomicUsize::new(0));
    // Most recent task per user
    let mut tails: HashMap<UserId, JoinHandle<()>> = HashMap::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let inbound: InboundEvent = match serde_json::from_str(&line) {
            Ok(inbound) => inbound,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed inbound line");
                continue;
            }
        };

        tails.retain(|_, task| !task.is_finished());
        let user_id = inbound.user_id;
        let previous = tails.remove(&user_id);
        let dispatcher = Arc::clone(dispatcher);
        let handled = Arc::clone(&handled);
        let task = tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    tracing::error!(user_id = %user_id, error = %e, "Event task panicked");
                }
            }
            match dispatcher.dispatch(&inbound).await {
                Ok(_) => {
                    handled.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => tracing::error!(user_id = %user_id, error = %e, "Event failed"),
            }
        });
        tails.insert(user_id, task);
    }

    // Each tail has already awaited the earlier tasks of its user
    for (user_id, task) in tails {
        if let Err(e) = task.await {
            tracing::error!(user_id = %user_id, error = %e, "Event task panicked");
        }
    }
    Ok(handled.load(Ordering::Relaxed))
}
