//! Error types for webterm.

use thiserror::Error;

/// Main error type for webterm operations.
#[derive(Error, Debug)]
pub enum TerminalError {
    /// The caller has no live session (never connected, disconnected or expired).
    #[error("no active terminal session")]
    NoActiveSession,

    /// The process working directory could not be read while creating a session.
    #[error("unable to determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience Result type for webterm operations.
pub type Result<T> = std::result::Result<T, TerminalError>;
