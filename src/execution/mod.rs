//! Command execution engine.
//!
//! `cd` is handled in-process and only ever changes the directory recorded
//! for the session. Everything else runs once through the shell with the
//! session's directory and environment, under a hard timeout.
//!
//! # Example
//!
//! ```no_run
//! use webterm::execution::CommandExecutor;
//! use webterm::session::{AmbientSnapshot, SessionRecord};
//!
//! # async fn run() -> webterm::Result<()> {
//! let record = SessionRecord::capture(AmbientSnapshot::capture()?);
//! let outcome = CommandExecutor::new().execute(&record, "ls -la").await;
//! println!("{}", outcome.output);
//! # Ok(())
//! # }
//! ```

mod command;
mod executor;
mod result;

pub use command::{missing_directory_message, resolve_target, ShellCommand};
pub use executor::{CommandExecutor, DEFAULT_SHELL, DEFAULT_TIMEOUT};
pub use result::ExecutionOutcome;
