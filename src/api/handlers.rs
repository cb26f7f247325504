//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    Json,
};

use super::types::{
    ErrorResponse, ExecuteCommandRequest, ExecuteCommandResponse, SessionStatusResponse,
    StatusResponse,
};
use crate::error::TerminalError;
use crate::execution::CommandExecutor;
use crate::lifecycle::TerminalService;
use crate::notify::NotificationHub;
use crate::security::{Caller, TokenRegistry};
use crate::session::{SessionId, SessionStore};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub terminal: Arc<TerminalService>,
    pub auth: Arc<TokenRegistry>,
}

impl AppState {
    pub fn new(terminal: Arc<TerminalService>, auth: Arc<TokenRegistry>) -> Self {
        Self { terminal, auth }
    }
}

impl Default for AppState {
    /// Default store, executor and hub, with authentication disabled.
    fn default() -> Self {
        let terminal = TerminalService::new(
            Arc::new(SessionStore::new()),
            CommandExecutor::new(),
            Arc::new(NotificationHub::new()),
        );
        Self::new(Arc::new(terminal), Arc::new(TokenRegistry::disabled()))
    }
}

impl FromRef<AppState> for Arc<TokenRegistry> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.auth)
    }
}

fn no_active_session() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::no_active_session()),
    )
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// Create (or replace) the caller's terminal session.
pub async fn connect(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> ApiResult<Json<StatusResponse>> {
    tracing::info!(%user, "Terminal connect called");

    state.terminal.connect(user).map_err(|e| {
        tracing::error!(%user, "Failed to create session: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::connect_failed(e.to_string())),
        )
    })?;

    Ok(Json(StatusResponse::connected()))
}

fn invalid_command(error: ErrorResponse) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(error))
}

/// Execute a command in the caller's session.
///
/// Any body that does not yield a non-blank string `command` is answered
/// with 422, including a missing body or content type.
pub async fn execute(
    State(state): State<AppState>,
    Caller(user): Caller,
    payload: Result<Json<ExecuteCommandRequest>, JsonRejection>,
) -> ApiResult<Json<ExecuteCommandResponse>> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(JsonRejection::JsonDataError(e)) => {
            tracing::debug!(%user, "Rejected execute body: {}", e);
            return Err(invalid_command(ErrorResponse::command_not_string()));
        }
        Err(e) => {
            tracing::debug!(%user, "Rejected execute body: {}", e);
            return Err(invalid_command(ErrorResponse::command_required()));
        }
    };
    let command = req
        .command()
        .ok_or_else(|| invalid_command(ErrorResponse::command_required()))?;

    match state.terminal.execute(user, command).await {
        Ok(outcome) => Ok(Json(ExecuteCommandResponse::executed(&outcome.working_dir))),
        Err(TerminalError::NoActiveSession) => Err(no_active_session()),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::execution_failed(e.to_string())),
        )),
    }
}

/// End the caller's session. Succeeds whether or not one exists.
pub async fn disconnect(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> Json<StatusResponse> {
    tracing::info!(%user, "Terminal disconnect called");
    state.terminal.disconnect(user);
    Json(StatusResponse::disconnected())
}

/// Describe the caller's session.
pub async fn session_status(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> ApiResult<Json<SessionStatusResponse>> {
    let record = state
        .terminal
        .session(user)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(e.to_string())),
            )
        })?
        .ok_or_else(no_active_session)?;

    Ok(Json(SessionStatusResponse::from_record(
        SessionId::for_user(user),
        &record,
    )))
}
