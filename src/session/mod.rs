//! Session management module.
//!
//! A session is a small per-user record (working directory, environment,
//! timestamps) kept in a keyed store with a fixed time-to-live.

mod id;
mod record;
mod store;

pub use id::{SessionId, UserId};
pub use record::{AmbientSnapshot, SessionRecord, DEFAULT_HOME, DEFAULT_PATH, DEFAULT_USER};
pub use store::{spawn_sweeper, SessionStore, DEFAULT_TTL};
