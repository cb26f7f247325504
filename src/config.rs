//! Configuration management for webterm.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{AppState, ServerConfig};
use crate::cli::Args;
use crate::execution::{CommandExecutor, DEFAULT_SHELL};
use crate::lifecycle::TerminalService;
use crate::notify::NotificationHub;
use crate::security::{parse_token_grant, AuthConfig, TokenRegistry};
use crate::session::{SessionStore, UserId};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Session and command execution settings.
    pub session: SessionSection,
    /// Security configuration.
    pub security: SecuritySection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

/// Session configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Idle lifetime of a session record, in seconds.
    pub ttl_secs: u64,
    /// Wall-clock limit per command, in seconds.
    pub command_timeout_secs: u64,
    /// How often expired records are purged, in seconds.
    pub sweep_interval_secs: u64,
    /// Shell used to interpret command lines.
    pub shell: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            command_timeout_secs: 30,
            sweep_interval_secs: 60,
            shell: DEFAULT_SHELL.to_string(),
        }
    }
}

impl SessionSection {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Security configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    /// Authentication settings.
    pub auth: AuthSection,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Enable authentication.
    pub enabled: bool,
    /// User every request acts as while authentication is disabled.
    pub default_user: u64,
    /// Bearer tokens and the user each one authenticates as.
    pub tokens: HashMap<String, u64>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            enabled: false,
            default_user: 1,
            tokens: HashMap::new(),
        }
    }
}

impl AuthSection {
    fn grant(&mut self, token: String, user: UserId) {
        self.enabled = true;
        self.tokens.insert(token, user.as_u64());
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("WEBTERM_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("WEBTERM_PORT") {
            self.server.port = parse_env("WEBTERM_PORT", port)?;
        }

        if let Some(grant) = lookup("WEBTERM_TOKEN").filter(|g| !g.is_empty()) {
            let (token, user) = parse_token_grant(&grant)
                .ok_or_else(|| ConfigError::InvalidValue("WEBTERM_TOKEN", grant.clone()))?;
            self.security.auth.grant(token, user);
        }

        if let Some(level) = lookup("WEBTERM_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.logging.level = level;
        }

        if let Some(ttl) = lookup("WEBTERM_SESSION_TTL") {
            self.session.ttl_secs = parse_env("WEBTERM_SESSION_TTL", ttl)?;
        }

        if let Some(timeout) = lookup("WEBTERM_COMMAND_TIMEOUT") {
            self.session.command_timeout_secs = parse_env("WEBTERM_COMMAND_TIMEOUT", timeout)?;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    ///
    /// Host and port are only overridden when given on the command line.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }

        for (token, user) in &args.tokens {
            self.security.auth.grant(token.clone(), *user);
        }

        if args.no_auth {
            self.security.auth.enabled = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env()?;
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let server_config = ServerConfig::new(host.to_string(), self.server.port);
        if self.server.graceful_shutdown {
            Ok(server_config)
        } else {
            Ok(server_config.without_graceful_shutdown())
        }
    }

    /// Build the token registry described by the auth section.
    pub fn token_registry(&self) -> TokenRegistry {
        let auth = &self.security.auth;
        let config = AuthConfig {
            enabled: auth.enabled,
            default_user: UserId::new(auth.default_user),
            ..AuthConfig::default()
        };
        let tokens = auth
            .tokens
            .iter()
            .map(|(token, user)| (token.clone(), UserId::new(*user)));
        TokenRegistry::with_tokens(config, tokens)
    }

    /// Wire up store, executor, hub and auth into the shared server state.
    pub fn build_state(&self) -> AppState {
        let store = Arc::new(SessionStore::with_ttl(self.session.ttl()));
        let executor = CommandExecutor::new()
            .shell(self.session.shell.clone())
            .timeout(self.session.command_timeout());
        let terminal = TerminalService::new(store, executor, Arc::new(NotificationHub::new()));

        AppState::new(Arc::new(terminal), Arc::new(self.token_registry()))
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name, value))
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Environment variable with an unusable value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::InvalidValue(name, value) => write!(f, "invalid value for {}: '{}'", name, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::TerminalError {
    fn from(e: ConfigError) -> Self {
        crate::TerminalError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(!config.security.auth.enabled);
        assert_eq!(config.security.auth.default_user, 1);
        assert_eq!(config.session.ttl(), Duration::from_secs(3600));
        assert_eq!(config.session.command_timeout(), Duration::from_secs(30));
        assert_eq!(config.session.shell, "/bin/sh");
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "server": {
                "host": "0.0.0.0",
                "port": 8080
            },
            "session": {
                "ttl_secs": 120,
                "command_timeout_secs": 5
            },
            "security": {
                "auth": {
                    "enabled": true,
                    "tokens": {"key1": 1, "key2": 2}
                }
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.ttl_secs, 120);
        assert_eq!(config.session.command_timeout_secs, 5);
        assert_eq!(config.session.sweep_interval_secs, 60);
        assert!(config.security.auth.enabled);
        assert_eq!(config.security.auth.tokens.len(), 2);
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{
            "server": {
                "port": 9000
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1"); // Default
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_config_missing_file() {
        let result = Config::from_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_apply_env() {
        let mut config = Config::default();
        config
            .apply_env_from(env(&[
                ("WEBTERM_HOST", "10.0.0.1"),
                ("WEBTERM_PORT", "4000"),
                ("WEBTERM_TOKEN", "secret=5"),
                ("WEBTERM_SESSION_TTL", "60"),
                ("WEBTERM_COMMAND_TIMEOUT", "2"),
                ("RUST_LOG", "trace"),
            ]))
            .unwrap();

        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert!(config.security.auth.enabled);
        assert_eq!(config.security.auth.tokens.get("secret"), Some(&5));
        assert_eq!(config.session.ttl_secs, 60);
        assert_eq!(config.session.command_timeout_secs, 2);
        assert_eq!(config.log_filter(), "trace");
    }

    #[test]
    fn test_env_log_level_wins_over_rust_log() {
        let mut config = Config::default();
        config
            .apply_env_from(env(&[("WEBTERM_LOG_LEVEL", "warn"), ("RUST_LOG", "trace")]))
            .unwrap();
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_apply_env_invalid_port() {
        let mut config = Config::default();
        let result = config.apply_env_from(env(&[("WEBTERM_PORT", "http")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue("WEBTERM_PORT", _))));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            host: Some("192.168.1.1".parse().unwrap()),
            port: Some(5000),
            tokens: vec![("test-key".to_string(), UserId::new(3))],
            log_level: Some("debug".to_string()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 5000);
        assert!(config.security.auth.enabled);
        assert_eq!(config.security.auth.tokens.get("test-key"), Some(&3));
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_args_without_host_keep_env_value() {
        let mut config = Config::default();
        config
            .apply_env_from(env(&[("WEBTERM_PORT", "4000")]))
            .unwrap();
        config.apply_args(&Args::default());
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_apply_no_auth() {
        let mut config = Config::default();
        config.security.auth.enabled = true;

        let args = Args {
            no_auth: true,
            ..Args::default()
        };

        config.apply_args(&args);
        assert!(!config.security.auth.enabled);
    }

    #[test]
    fn test_to_server_config() {
        let config = Config::default();
        let server_config = config.to_server_config().unwrap();

        assert_eq!(server_config.host, "127.0.0.1");
        assert_eq!(server_config.port, 3000);
        assert!(server_config.graceful_shutdown);
    }

    #[test]
    fn test_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();

        let result = config.to_server_config();
        assert!(matches!(result, Err(ConfigError::InvalidHost(_))));
    }

    #[test]
    fn test_token_registry() {
        let mut config = Config::default();
        config.security.auth.grant("abc".to_string(), UserId::new(9));

        let registry = config.token_registry();
        assert!(registry.is_enabled());
        assert_eq!(registry.lookup("abc").unwrap(), Some(UserId::new(9)));
    }

    #[test]
    fn test_build_state() {
        let mut config = Config::default();
        config.session.ttl_secs = 10;

        let state = config.build_state();
        assert_eq!(state.terminal.store().ttl(), Duration::from_secs(10));
        assert!(!state.auth.is_enabled());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"host\""));
        assert!(json.contains("\"ttl_secs\""));
    }
}
