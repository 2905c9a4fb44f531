//! Actions produced by state transitions

use crate::script::Payload;
use serde::{Deserialize, Serialize};

/// Outbound action, performed by the caller in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SendText { text: String },
    /// Hand the payload reference to the delivery collaborator
    SendPayload { payload: Payload },
}

impl Action {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Action::SendText { text: text.into() }
    }

    #[must_use]
    pub fn payload(payload: &Payload) -> Self {
        Action::SendPayload {
            payload: payload.clone(),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Action::SendText { text } => Some(text),
            Action::SendPayload { .. } => None,
        }
    }
}
