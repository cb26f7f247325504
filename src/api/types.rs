//! API request and response types.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::session::{SessionId, SessionRecord};

/// Request to execute a command.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExecuteCommandRequest {
    /// The command line to execute. Required and non-blank.
    #[serde(default)]
    pub command: Option<String>,
}

impl ExecuteCommandRequest {
    /// The command, if present and not blank.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Acknowledgement for connect and disconnect.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn connected() -> Self {
        Self {
            status: "connected",
        }
    }

    pub fn disconnected() -> Self {
        Self {
            status: "disconnected",
        }
    }
}

/// Response for command execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteCommandResponse {
    pub status: &'static str,
    /// Session working directory after the command.
    pub cwd: String,
}

impl ExecuteCommandResponse {
    pub fn executed(cwd: &Path) -> Self {
        Self {
            status: "executed",
            cwd: cwd.to_string_lossy().into_owned(),
        }
    }
}

/// Response for session status query.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    pub status: &'static str,
    pub session_id: String,
    pub cwd: String,
    /// Unix timestamp (seconds).
    pub created_at: u64,
    /// Unix timestamp (seconds).
    pub last_activity: u64,
}

impl SessionStatusResponse {
    pub fn from_record(id: SessionId, record: &SessionRecord) -> Self {
        Self {
            status: "active",
            session_id: id.to_string(),
            cwd: record.working_dir.to_string_lossy().into_owned(),
            created_at: unix_seconds(record.created_at),
            last_activity: unix_seconds(record.last_activity),
        }
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Short description of what failed.
    pub error: String,
    /// Underlying error message, exposed as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn no_active_session() -> Self {
        Self::new("No active terminal session")
    }

    pub fn command_required() -> Self {
        Self::new("The command field is required.")
    }

    pub fn command_not_string() -> Self {
        Self::new("The command field must be a string.")
    }

    pub fn connect_failed(message: impl Into<String>) -> Self {
        Self::new("Failed to create terminal session").with_message(message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("Command execution failed").with_message(message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("Internal error").with_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AmbientSnapshot, UserId};
    use serde_json::json;

    #[test]
    fn test_execute_request_command() {
        let req: ExecuteCommandRequest = serde_json::from_str(r#"{"command": "ls"}"#).unwrap();
        assert_eq!(req.command(), Some("ls"));
    }

    #[test]
    fn test_execute_request_missing_or_blank() {
        let req: ExecuteCommandRequest = serde_json::from_str("{}").unwrap();
        assert!(req.command().is_none());

        let req: ExecuteCommandRequest = serde_json::from_str(r#"{"command": "  "}"#).unwrap();
        assert!(req.command().is_none());
    }

    #[test]
    fn test_status_response_json() {
        let value = serde_json::to_value(StatusResponse::connected()).unwrap();
        assert_eq!(value, json!({"status": "connected"}));
    }

    #[test]
    fn test_execute_response_json() {
        let value = serde_json::to_value(ExecuteCommandResponse::executed(Path::new("/srv"))).unwrap();
        assert_eq!(value, json!({"status": "executed", "cwd": "/srv"}));
    }

    #[test]
    fn test_session_status_response() {
        let record = SessionRecord::capture(AmbientSnapshot::from_lookup("/srv", |_| None));
        let response = SessionStatusResponse::from_record(SessionId::for_user(UserId::new(3)), &record);
        assert_eq!(response.session_id, "user_3");
        assert_eq!(response.cwd, "/srv");
        assert!(response.created_at > 0);
        assert_eq!(response.created_at, response.last_activity);
    }

    #[test]
    fn test_error_response_serialization() {
        let json = serde_json::to_value(ErrorResponse::no_active_session()).unwrap();
        assert_eq!(json, json!({"error": "No active terminal session"}));

        let json = serde_json::to_value(ErrorResponse::execution_failed("boom")).unwrap();
        assert_eq!(json["message"], "boom");
    }
}
