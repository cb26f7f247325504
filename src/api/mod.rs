//! HTTP layer for webterm.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (no authentication)
//! - `POST /api/terminal/connect` - Create or replace the caller's session
//! - `POST /api/terminal/execute` - Run `{"command": "..."}` in the session
//! - `POST /api/terminal/disconnect` - Destroy the session
//! - `GET /api/terminal/session` - Describe the session
//! - `WS /api/terminal/events` - Push stream of output and disconnect events
//!
//! Every `/api/terminal` route resolves the caller from
//! `Authorization: Bearer <token>` (or `?token=` for WebSocket clients).
//!
//! ## Example
//!
//! ```no_run
//! use webterm::api::{ServerConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> webterm::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1", 3000);
//!     serve(config).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;
pub mod websocket;

// Re-export commonly used types
pub use handlers::{ApiResult, AppState};
pub use router::{create_router, create_router_with_state, serve, serve_with_state, ServerConfig};
pub use types::{
    ErrorResponse, ExecuteCommandRequest, ExecuteCommandResponse, SessionStatusResponse,
    StatusResponse,
};
