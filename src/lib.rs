//! # webterm
//!
//! Backend for a browser-based pseudo-terminal.
//!
//! Each authenticated user owns at most one terminal session: a working
//! directory and an environment snapshot kept in an expiring store. Commands
//! run one at a time as fresh shell processes inside that context, with `cd`
//! handled by the service itself. Output is not returned from the request
//! that ran the command; it is pushed to the user's notification channel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use webterm::{CommandExecutor, NotificationHub, SessionStore, TerminalService, UserId};
//!
//! #[tokio::main]
//! async fn main() -> webterm::Result<()> {
//!     webterm::logging::try_init().ok();
//!
//!     let hub = Arc::new(NotificationHub::new());
//!     let terminal = TerminalService::new(
//!         Arc::new(SessionStore::new()),
//!         CommandExecutor::new(),
//!         Arc::clone(&hub),
//!     );
//!
//!     let user = UserId::new(1);
//!     let mut events = hub.subscribe(user)?;
//!
//!     terminal.connect(user)?;
//!     terminal.execute(user, "echo hello").await?;
//!
//!     while let Ok(event) = events.try_recv() {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod lifecycle;
pub mod logging;
pub mod notify;
pub mod security;
pub mod session;

// Re-export commonly used types
pub use error::{Result, TerminalError};
pub use execution::{CommandExecutor, ExecutionOutcome, ShellCommand};
pub use lifecycle::TerminalService;
pub use notify::{NotificationHub, OutputKind, TerminalEvent};
pub use session::{SessionId, SessionRecord, SessionStore, UserId};
