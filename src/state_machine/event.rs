//! Events that drive a conversation

use super::state::UserId;
use crate::script::Script;
use serde::{Deserialize, Serialize};

/// Inbound message as delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub user_id: UserId,
    /// Raw message text; absent for stickers, photos and other non-text messages
    #[serde(default)]
    pub text: Option<String>,
}

impl InboundEvent {
    #[must_use]
    pub fn text(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: Some(text.into()),
        }
    }

    #[must_use]
    pub fn non_text(user_id: UserId) -> Self {
        Self {
            user_id,
            text: None,
        }
    }

    /// Classify the message against the script's restart command
    #[must_use]
    pub fn to_event(&self, script: &Script) -> Event {
        match &self.text {
            Some(text) if script.is_restart(text) => Event::Restart,
            Some(text) => Event::Text(text.clone()),
            None => Event::NonText,
        }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The restart command; always starts over
    Restart,
    /// Any other text, kept raw
    Text(String),
    NonText,
}
