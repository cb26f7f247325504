//! Broadcast topics keyed by user.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast;

use super::TerminalEvent;
use crate::error::TerminalError;
use crate::session::UserId;
use crate::Result;

/// Buffered events per topic before lagging subscribers lose the oldest.
pub const TOPIC_CAPACITY: usize = 256;

/// Fan-out of terminal events to each user's subscribers.
#[derive(Debug, Default)]
pub struct NotificationHub {
    topics: RwLock<HashMap<UserId, broadcast::Sender<TerminalEvent>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events published for `user` from now on.
    pub fn subscribe(&self, user: UserId) -> Result<broadcast::Receiver<TerminalEvent>> {
        let mut topics = self
            .topics
            .write()
            .map_err(|_| TerminalError::LockPoisoned)?;

        let sender = topics
            .entry(user)
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0);
        Ok(sender.subscribe())
    }

    /// Publish an event to `user`'s topic.
    ///
    /// Returns how many subscribers received it. Publishing with nobody
    /// listening is not an error; topics without receivers are dropped.
    pub fn publish(&self, user: UserId, event: TerminalEvent) -> usize {
        let delivered = {
            let Ok(topics) = self.topics.read() else {
                tracing::error!(%user, "Notification hub lock poisoned, event dropped");
                return 0;
            };
            match topics.get(&user) {
                Some(sender) => sender.send(event).ok(),
                None => Some(0),
            }
        };

        match delivered {
            Some(n) => {
                tracing::trace!(%user, receivers = n, "Published terminal event");
                n
            }
            None => {
                self.release(user);
                0
            }
        }
    }

    /// Number of live subscribers for `user`.
    pub fn subscriber_count(&self, user: UserId) -> usize {
        self.topics
            .read()
            .ok()
            .and_then(|topics| topics.get(&user).map(|s| s.receiver_count()))
            .unwrap_or(0)
    }

    /// Drop `user`'s topic once its last receiver is gone.
    ///
    /// Subscribers call this after dropping their receiver. A topic that
    /// still has receivers is kept.
    pub fn release(&self, user: UserId) {
        match self.topics.write() {
            Ok(mut topics) => {
                if topics.get(&user).is_some_and(|s| s.receiver_count() == 0) {
                    topics.remove(&user);
                    tracing::trace!(%user, "Released notification topic");
                }
            }
            Err(_) => tracing::error!(%user, "Notification hub lock poisoned, topic kept"),
        }
    }

    #[cfg(test)]
    pub(crate) fn has_topic(&self, user: UserId) -> bool {
        self.topics
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(&user)
    }
}
