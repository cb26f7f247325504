//! Session storage with fixed time-to-live.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use super::{SessionId, SessionRecord};
use crate::error::TerminalError;
use crate::Result;

/// Default session lifetime, counted from the last write.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// A stored record and the instant it stops being visible.
#[derive(Debug, Clone)]
struct Entry {
    record: SessionRecord,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe keyed storage for session records.
///
/// Every `put` overwrites the previous record and restarts its TTL. Expired
/// records read as absent immediately; `sweep_expired` reclaims their memory.
/// Individual operations are atomic, but read-modify-write sequences are not:
/// concurrent writers for the same id resolve as last write wins.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a new empty store using [`DEFAULT_TTL`].
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a new empty store with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `record` under `id`, replacing any previous record.
    pub fn put(&self, id: SessionId, record: SessionRecord) -> Result<()> {
        let entry = Entry {
            record,
            expires_at: Instant::now() + self.ttl,
        };

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| TerminalError::LockPoisoned)?;

        sessions.insert(id, entry);
        Ok(())
    }

    /// Get a clone of the live record for `id`.
    pub fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| TerminalError::LockPoisoned)?;

        let now = Instant::now();
        Ok(sessions
            .get(id)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.record.clone()))
    }

    /// Check if a live record exists.
    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Remove the record for `id`.
    ///
    /// Returns whether a live record was removed. Removing an absent record
    /// is not an error.
    pub fn delete(&self, id: &SessionId) -> Result<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| TerminalError::LockPoisoned)?;

        let now = Instant::now();
        Ok(sessions
            .remove(id)
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep_expired(&self) -> Result<usize> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| TerminalError::LockPoisoned)?;

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now));
        Ok(before - sessions.len())
    }

    /// Number of live records.
    pub fn count(&self) -> Result<usize> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| TerminalError::LockPoisoned)?;

        let now = Instant::now();
        Ok(sessions.values().filter(|entry| !entry.is_expired(now)).count())
    }

    /// Poison the lock so every later operation fails.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.sessions.write();
            panic!("poisoning session store");
        }));
        assert!(result.is_err());
    }

    /// Read a record regardless of lock poisoning or expiry.
    #[cfg(test)]
    pub(crate) fn peek(&self, id: &SessionId) -> Option<SessionRecord> {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.get(id).map(|entry| entry.record.clone())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically evict expired sessions.
///
/// The task runs until aborted through the returned handle.
pub fn spawn_sweeper(store: Arc<SessionStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.sweep_expired() {
                Ok(0) => {}
                Ok(n) => tracing::debug!(evicted = n, "Swept expired terminal sessions"),
                Err(e) => {
                    tracing::error!("Session sweep failed: {}", e);
                    break;
                }
            }
        }
    })
}
