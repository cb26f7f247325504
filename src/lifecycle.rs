//! Session lifecycle: connect, execute, disconnect.
//!
//! This is the transport-independent half of the terminal API. Callers are
//! already authenticated; every operation is keyed by the caller's
//! [`UserId`]. Notifications are published without waiting for delivery.

use std::sync::Arc;

use crate::error::TerminalError;
use crate::execution::{CommandExecutor, ExecutionOutcome};
use crate::notify::{NotificationHub, TerminalEvent};
use crate::session::{AmbientSnapshot, SessionId, SessionRecord, SessionStore, UserId};
use crate::Result;

/// Greeting pushed when a session is created.
pub const SESSION_STARTED: &str = "Terminal session started\n";

/// Owns the wiring between session store, executor and notification hub.
pub struct TerminalService {
    store: Arc<SessionStore>,
    executor: CommandExecutor,
    hub: Arc<NotificationHub>,
}

impl TerminalService {
    pub fn new(store: Arc<SessionStore>, executor: CommandExecutor, hub: Arc<NotificationHub>) -> Self {
        Self {
            store,
            executor,
            hub,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// Start a fresh session for `user` from the current process directory
    /// and environment, replacing any session the user already had.
    pub fn connect(&self, user: UserId) -> Result<()> {
        let ambient = AmbientSnapshot::capture()?;
        self.connect_with(user, ambient)
    }

    /// Start a fresh session for `user` from an explicit snapshot.
    pub fn connect_with(&self, user: UserId, ambient: AmbientSnapshot) -> Result<()> {
        let id = SessionId::for_user(user);
        let record = SessionRecord::capture(ambient);
        tracing::debug!(session = %id, cwd = %record.working_dir.display(), "Creating terminal session");

        self.store.put(id, record)?;
        tracing::info!(session = %id, "Created terminal session");

        self.hub.publish(user, TerminalEvent::output(SESSION_STARTED));
        Ok(())
    }

    /// Run one command line in `user`'s session.
    ///
    /// Fails with [`TerminalError::NoActiveSession`] when the user has no
    /// live session; nothing is spawned in that case. Command failures are
    /// part of the returned outcome, not errors. Any other error is also
    /// pushed to the user as an error notification, and the stored session
    /// is left as it was.
    pub async fn execute(&self, user: UserId, command_line: &str) -> Result<ExecutionOutcome> {
        match self.try_execute(user, command_line).await {
            Err(TerminalError::NoActiveSession) => Err(TerminalError::NoActiveSession),
            Err(e) => {
                tracing::error!(%user, "Command execution failed: {}", e);
                self.hub
                    .publish(user, TerminalEvent::error(format!("Error: {e}\n")));
                Err(e)
            }
            ok => ok,
        }
    }

    async fn try_execute(&self, user: UserId, command_line: &str) -> Result<ExecutionOutcome> {
        let id = SessionId::for_user(user);
        let mut record = self
            .store
            .get(&id)?
            .ok_or(TerminalError::NoActiveSession)?;

        record.touch();
        let outcome = self.executor.execute(&record, command_line).await;

        // Written back even when unchanged so the TTL restarts.
        record.working_dir = outcome.working_dir.clone();
        self.store.put(id, record)?;

        if outcome.has_error() {
            tracing::info!(session = %id, bytes = outcome.error.len(), "Broadcasting error output");
            self.hub
                .publish(user, TerminalEvent::error(outcome.error.clone()));
        }
        if outcome.has_output() {
            tracing::info!(session = %id, bytes = outcome.output.len(), "Broadcasting output");
            self.hub
                .publish(user, TerminalEvent::output(outcome.output.clone()));
        }

        Ok(outcome)
    }

    /// End `user`'s session, if any.
    ///
    /// Always succeeds and always publishes [`TerminalEvent::Disconnected`].
    /// A command still running for the user is not interrupted.
    pub fn disconnect(&self, user: UserId) {
        let id = SessionId::for_user(user);
        match self.store.delete(&id) {
            Ok(true) => tracing::info!(session = %id, "Destroyed terminal session"),
            Ok(false) => tracing::debug!(session = %id, "Disconnect without active session"),
            Err(e) => tracing::error!(session = %id, "Failed to destroy session: {}", e),
        }

        self.hub.publish(user, TerminalEvent::Disconnected);
    }

    /// Current session record for `user`, if live.
    pub fn session(&self, user: UserId) -> Result<Option<SessionRecord>> {
        self.store.get(&SessionId::for_user(user))
    }
}
