//! Per-user notification channel.
//!
//! Lifecycle operations push [`TerminalEvent`]s to the user's topic without
//! waiting on delivery. Subscribers (the WebSocket endpoint) receive every
//! event published after they subscribed; a slow subscriber that falls more
//! than [`TOPIC_CAPACITY`] events behind skips the oldest ones.

mod event;
mod hub;

pub use event::{OutputKind, TerminalEvent};
pub use hub::{NotificationHub, TOPIC_CAPACITY};
