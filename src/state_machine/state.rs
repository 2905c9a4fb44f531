//! Session record and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the user a conversation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Where a user is in the script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    /// Answering question `index` (0-based)
    Quiz { index: usize },
    /// Waiting for the secret of gate `index` (0-based)
    Gate { index: usize },
}

/// Per-user conversation state.
///
/// A user without a session is idle. Completing the last gate clears the
/// session rather than storing a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub stage: Stage,
}

impl Session {
    /// State right after a restart
    #[must_use]
    pub fn fresh() -> Self {
        Self::quiz(0)
    }

    #[must_use]
    pub fn quiz(index: usize) -> Self {
        Self {
            stage: Stage::Quiz { index },
        }
    }

    #[must_use]
    pub fn gate(index: usize) -> Self {
        Self {
            stage: Stage::Gate { index },
        }
    }

    /// Question index, only meaningful while in the quiz
    #[must_use]
    pub fn quiz_index(&self) -> Option<usize> {
        match self.stage {
            Stage::Quiz { index } => Some(index),
            Stage::Gate { .. } => None,
        }
    }

    /// Short label for logs
    #[must_use]
    pub fn label(session: Option<&Session>) -> String {
        match session.map(|s| s.stage) {
            None => "idle".to_string(),
            Some(Stage::Quiz { index }) => format!("quiz[{index}]"),
            Some(Stage::Gate { index }) => format!("gate[{index}]"),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::fresh()
    }
}
