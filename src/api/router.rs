//! API router configuration.

use axum::{
    routing::{any, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{connect, disconnect, execute, health, session_status, AppState};
use super::websocket::events_handler;

/// Create the API router with default state (authentication disabled).
pub fn create_router() -> Router {
    create_router_with_state(AppState::default())
}

/// Create the API router with custom state.
pub fn create_router_with_state(state: AppState) -> Router {
    let terminal_routes = Router::new()
        .route("/connect", post(connect))
        .route("/execute", post(execute))
        .route("/disconnect", post(disconnect))
        .route("/session", get(session_status))
        .route("/events", any(events_handler));

    Router::new()
        .route("/health", get(health))
        .nest("/api/terminal", terminal_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Stop accepting connections on ctrl-c and drain in-flight requests.
    pub graceful_shutdown: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            graceful_shutdown: true,
        }
    }

    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

/// Start the API server with default state.
pub async fn serve(config: ServerConfig) -> crate::Result<()> {
    serve_with_state(config, AppState::default()).await
}

/// Start the API server with custom state.
pub async fn serve_with_state(config: ServerConfig, state: AppState) -> crate::Result<()> {
    let addr = config.bind_address();
    let router = create_router_with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("webterm API listening on {}", addr);

    let server = axum::serve(listener, router);
    if config.graceful_shutdown {
        server.with_graceful_shutdown(shutdown_signal()).await?;
    } else {
        server.await?;
    }

    tracing::info!("webterm API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.graceful_shutdown);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_server_config_custom() {
        let config = ServerConfig::new("0.0.0.0", 8080).without_graceful_shutdown();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(!config.graceful_shutdown);
    }

    #[test]
    fn test_router_creation() {
        let _router = create_router();
    }
}
