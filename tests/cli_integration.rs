//! CLI integration tests.
//!
//! These tests verify the CLI argument parsing and configuration loading.

use std::ffi::OsString;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

use webterm::cli::{parse_args_from, Args};
use webterm::config::Config;
use webterm::UserId;

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("webterm")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

fn config_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_defaults() {
    let result = parse_args_from(args(&[])).unwrap();

    assert!(result.host.is_none());
    assert!(result.port.is_none());
    assert!(!result.no_auth);
    assert!(result.config.is_none());
    assert!(result.tokens.is_empty());
}

#[test]
fn test_cli_full_options() {
    let result = parse_args_from(args(&[
        "-H",
        "0.0.0.0",
        "-p",
        "8080",
        "-k",
        "alice=1",
        "-k",
        "bob=2",
        "-l",
        "debug",
    ]))
    .unwrap();

    assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
    assert_eq!(result.port, Some(8080));
    assert_eq!(result.tokens.len(), 2);
    assert_eq!(result.log_level, Some("debug".to_string()));
    assert!(!result.no_auth);
}

#[test]
fn test_cli_config_file() {
    let result = parse_args_from(args(&["-c", "/etc/webterm.json"])).unwrap();

    assert_eq!(
        result.config.unwrap().to_str().unwrap(),
        "/etc/webterm.json"
    );
}

#[test]
fn test_cli_invalid_port() {
    let result = parse_args_from(args(&["-p", "not-a-number"]));
    assert!(result.is_err());
}

#[test]
fn test_cli_invalid_host() {
    let result = parse_args_from(args(&["-H", "not-an-ip"]));
    assert!(result.is_err());
}

// ============================================================================
// Configuration Loading Tests
// ============================================================================

#[test]
fn test_config_from_json_file() {
    let file = config_file(
        r#"{
        "server": {
            "host": "192.168.1.100",
            "port": 9000,
            "graceful_shutdown": false
        },
        "session": {
            "ttl_secs": 600,
            "command_timeout_secs": 10,
            "sweep_interval_secs": 15,
            "shell": "/bin/bash"
        },
        "security": {
            "auth": {
                "enabled": true,
                "default_user": 3,
                "tokens": {"key1": 1, "key2": 2}
            }
        },
        "logging": {
            "level": "debug"
        }
    }"#,
    );

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.server.host, "192.168.1.100");
    assert_eq!(config.server.port, 9000);
    assert!(!config.server.graceful_shutdown);
    assert_eq!(config.session.ttl(), Duration::from_secs(600));
    assert_eq!(config.session.command_timeout(), Duration::from_secs(10));
    assert_eq!(config.session.sweep_interval(), Duration::from_secs(15));
    assert_eq!(config.session.shell, "/bin/bash");
    assert!(config.security.auth.enabled);
    assert_eq!(config.security.auth.default_user, 3);
    assert_eq!(config.security.auth.tokens.len(), 2);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_config_invalid_json() {
    let file = config_file("{ not json");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_config_priority_cli_over_file() {
    let file = config_file(
        r#"{
        "server": {
            "host": "10.0.0.1",
            "port": 5000
        }
    }"#,
    );

    let args = Args {
        host: Some("192.168.1.1".parse().unwrap()),
        port: Some(8080),
        config: Some(file.path().to_path_buf()),
        ..Args::default()
    };

    let config = Config::load(&args).unwrap();

    assert_eq!(config.server.host, "192.168.1.1");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn test_config_file_used_without_cli_override() {
    let file = config_file(r#"{"server": {"host": "10.0.0.1", "port": 5000}}"#);
    let args = Args {
        config: Some(file.path().to_path_buf()),
        ..Args::default()
    };

    let config = Config::load(&args).unwrap();

    assert_eq!(config.server.host, "10.0.0.1");
    assert_eq!(config.server.port, 5000);
}

#[test]
fn test_config_token_enables_auth() {
    let args = Args {
        tokens: vec![("secret-key".to_string(), UserId::new(4))],
        ..Args::default()
    };

    let config = Config::load(&args).unwrap();

    assert!(config.security.auth.enabled);
    assert_eq!(config.security.auth.tokens.get("secret-key"), Some(&4));
}

#[test]
fn test_config_no_auth_disables() {
    let file = config_file(
        r#"{
        "security": {
            "auth": {
                "enabled": true,
                "tokens": {"key1": 1}
            }
        }
    }"#,
    );

    let args = Args {
        config: Some(file.path().to_path_buf()),
        no_auth: true,
        ..Args::default()
    };

    let config = Config::load(&args).unwrap();

    assert!(!config.security.auth.enabled);
    assert!(!config.token_registry().is_enabled());
}

#[test]
fn test_config_to_server_config() {
    let args = Args {
        host: Some("0.0.0.0".parse().unwrap()),
        port: Some(8080),
        tokens: vec![("test-key".to_string(), UserId::new(1))],
        ..Args::default()
    };

    let config = Config::load(&args).unwrap();
    let server_config = config.to_server_config().unwrap();
    let state = config.build_state();

    assert_eq!(server_config.host, "0.0.0.0");
    assert_eq!(server_config.port, 8080);
    assert!(state.auth.is_enabled());
    assert_eq!(state.auth.lookup("test-key").unwrap(), Some(UserId::new(1)));
}

// ============================================================================
// Configuration Serialization Tests
// ============================================================================

#[test]
fn test_config_roundtrip() {
    let original = Config::default();
    let json = serde_json::to_string(&original).unwrap();
    let loaded: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(original.server.host, loaded.server.host);
    assert_eq!(original.server.port, loaded.server.port);
    assert_eq!(original.session.ttl_secs, loaded.session.ttl_secs);
}

#[test]
fn test_config_partial_deserialization() {
    let json = r#"{"server": {"port": 9999}}"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.server.port, 9999);
    assert_eq!(config.server.host, "127.0.0.1"); // Default
    assert!(config.server.graceful_shutdown); // Default
    assert_eq!(config.session.command_timeout_secs, 30); // Default
}
