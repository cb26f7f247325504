//! Execution outcome type.

use std::path::PathBuf;
use std::time::Duration;

/// Result of running one command line against a session record.
///
/// Command failures never surface as errors; they are folded into `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Captured standard output.
    pub output: String,
    /// Captured standard error, or the failure message.
    pub error: String,
    /// Working directory the session should hold afterwards.
    pub working_dir: PathBuf,
    /// Exit code, if a process ran to completion.
    pub exit_code: Option<i32>,
    /// Whether the process was killed for exceeding the timeout.
    pub timed_out: bool,
    /// Wall-clock time spent.
    pub duration: Duration,
}

impl ExecutionOutcome {
    /// A builtin that completed without output.
    pub fn silent(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            output: String::new(),
            error: String::new(),
            working_dir: working_dir.into(),
            exit_code: None,
            timed_out: false,
            duration: Duration::ZERO,
        }
    }

    /// A failure reported as error text only.
    pub fn failed(working_dir: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::silent(working_dir)
        }
    }

    /// Mark the outcome as a timeout.
    pub fn with_timeout(mut self) -> Self {
        self.timed_out = true;
        self
    }

    /// Set the exit code.
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// Set the execution duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Check if the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
