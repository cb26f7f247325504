//! Notification payloads.

use serde::{Deserialize, Serialize};

/// Which stream an output event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Output,
    Error,
}

/// Event pushed to a user's notification topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TerminalEvent {
    /// A chunk of terminal text.
    Output { content: String, kind: OutputKind },
    /// The session ended.
    Disconnected,
}

impl TerminalEvent {
    pub fn output(content: impl Into<String>) -> Self {
        Self::Output {
            content: content.into(),
            kind: OutputKind::Output,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::Output {
            content: content.into(),
            kind: OutputKind::Error,
        }
    }
}
