//! Session record and the ambient snapshot it is created from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::TerminalError;
use crate::Result;

/// Fallback for `HOME`, also used by `cd` when the record has no `HOME`.
pub const DEFAULT_HOME: &str = "/tmp";
/// Fallback for `USER`.
pub const DEFAULT_USER: &str = "www-data";
/// Fallback for `PATH`.
pub const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Process directory and environment captured once when a session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbientSnapshot {
    pub working_dir: PathBuf,
    pub env: HashMap<String, String>,
}

impl AmbientSnapshot {
    /// Capture the current process directory plus `HOME`, `USER` and `PATH`.
    pub fn capture() -> Result<Self> {
        let working_dir = std::env::current_dir().map_err(TerminalError::WorkingDirectory)?;
        Ok(Self::from_lookup(working_dir, |key| std::env::var(key).ok()))
    }

    /// Build a snapshot from an arbitrary variable lookup.
    pub fn from_lookup<F>(working_dir: impl Into<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = HashMap::with_capacity(3);
        for (key, fallback) in [
            ("HOME", DEFAULT_HOME),
            ("USER", DEFAULT_USER),
            ("PATH", DEFAULT_PATH),
        ] {
            let value = lookup(key).unwrap_or_else(|| fallback.to_string());
            env.insert(key.to_string(), value);
        }

        Self {
            working_dir: working_dir.into(),
            env,
        }
    }
}

/// Per-user terminal session state.
///
/// The environment is fixed at creation. Only `working_dir` and
/// `last_activity` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Directory every command starts from.
    pub working_dir: PathBuf,
    /// Complete environment handed to spawned commands.
    pub env: HashMap<String, String>,
    pub created_at: SystemTime,
    pub last_activity: SystemTime,
}

impl SessionRecord {
    /// Create a fresh record from an ambient snapshot.
    pub fn capture(ambient: AmbientSnapshot) -> Self {
        let now = SystemTime::now();
        Self {
            working_dir: ambient.working_dir,
            env: ambient.env,
            created_at: now,
            last_activity: now,
        }
    }

    /// The session's home directory.
    pub fn home(&self) -> &str {
        self.env
            .get("HOME")
            .map(String::as_str)
            .unwrap_or(DEFAULT_HOME)
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Update the last activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = SystemTime::now();
    }
}
