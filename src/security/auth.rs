//! Bearer token authentication and caller resolution.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::error::TerminalError;
use crate::session::UserId;
use crate::Result;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Whether authentication is enabled.
    pub enabled: bool,
    /// Prefix for the token in the `Authorization` header (default: "Bearer ").
    pub prefix: String,
    /// Identity every request resolves to while authentication is disabled.
    pub default_user: UserId,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "Bearer ".to_string(),
            default_user: UserId::new(1),
        }
    }
}

impl AuthConfig {
    /// Create a disabled auth config (for development).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Thread-safe mapping from bearer tokens to users.
#[derive(Debug)]
pub struct TokenRegistry {
    tokens: RwLock<HashMap<String, UserId>>,
    config: AuthConfig,
}

impl TokenRegistry {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a registry with authentication disabled.
    pub fn disabled() -> Self {
        Self::new(AuthConfig::disabled())
    }

    /// Create a registry preloaded with token grants.
    pub fn with_tokens<I>(config: AuthConfig, tokens: I) -> Self
    where
        I: IntoIterator<Item = (String, UserId)>,
    {
        Self {
            tokens: RwLock::new(tokens.into_iter().collect()),
            config,
        }
    }

    /// Grant `token` the identity of `user`, replacing an earlier grant.
    pub fn grant(&self, token: impl Into<String>, user: UserId) -> Result<()> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| TerminalError::LockPoisoned)?;
        tokens.insert(token.into(), user);
        Ok(())
    }

    /// Revoke a token.
    pub fn revoke(&self, token: &str) -> Result<bool> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| TerminalError::LockPoisoned)?;
        Ok(tokens.remove(token).is_some())
    }

    /// User a token belongs to.
    pub fn lookup(&self, token: &str) -> Result<Option<UserId>> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| TerminalError::LockPoisoned)?;
        Ok(tokens.get(token).copied())
    }

    /// Get the number of registered tokens.
    pub fn count(&self) -> Result<usize> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| TerminalError::LockPoisoned)?;
        Ok(tokens.len())
    }

    /// Check if authentication is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Extract the token from an authorization header value.
    pub fn extract_token<'a>(&self, header_value: &'a str) -> Option<&'a str> {
        header_value.strip_prefix(self.config.prefix.as_str())
    }

    /// Resolve the caller from an `Authorization` header or a `token` query
    /// parameter. The header wins when both are present.
    pub fn authenticate(
        &self,
        header: Option<&str>,
        query_token: Option<&str>,
    ) -> Result<Option<UserId>> {
        if !self.config.enabled {
            return Ok(Some(self.config.default_user));
        }

        match header.and_then(|h| self.extract_token(h)).or(query_token) {
            Some(token) => self.lookup(token),
            None => Ok(None),
        }
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new(AuthConfig::default())
    }
}

/// Parse a `TOKEN[=USER]` grant. The user defaults to 1.
pub fn parse_token_grant(grant: &str) -> Option<(String, UserId)> {
    let (token, user) = match grant.split_once('=') {
        Some((token, user)) => (token, user.parse().ok()?),
        None => (grant, UserId::new(1)),
    };
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some((token.to_string(), user))
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// The authenticated user making a request.
///
/// Rejects with `401 {"error": "Unauthorized"}` when no identity resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

/// Rejection for requests without a resolvable identity.
#[derive(Debug, Clone, Copy)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Unauthorized" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    Arc<TokenRegistry>: FromRef<S>,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let registry = Arc::<TokenRegistry>::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let query_token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token);

        match registry.authenticate(header, query_token.as_deref()) {
            Ok(Some(user)) => Ok(Caller(user)),
            Ok(None) => {
                tracing::warn!(path = %parts.uri.path(), "Request without authenticated user");
                Err(Unauthorized)
            }
            Err(e) => {
                tracing::error!(path = %parts.uri.path(), "Token lookup failed: {}", e);
                Err(Unauthorized)
            }
        }
    }
}
