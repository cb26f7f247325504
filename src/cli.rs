//! Command-line interface for webterm.
//!
//! Uses lexopt to keep the argument parser small.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::security::parse_token_grant;
use crate::session::UserId;

/// Command-line arguments.
///
/// Options left unset fall through to the environment and config file.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Token grants (`TOKEN[=USER]`), enabling authentication.
    pub tokens: Vec<(String, UserId)>,
    /// Disable authentication.
    pub no_auth: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('k') | Long("token") => {
                let value: String = parser.value()?.parse()?;
                let grant =
                    parse_token_grant(&value).ok_or(ArgsError::InvalidValue("token", value))?;
                result.tokens.push(grant);
            }
            Long("no-auth") => {
                result.no_auth = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"webterm {version}
Browser terminal backend: per-user shell sessions over HTTP

USAGE:
    webterm [OPTIONS]

OPTIONS:
    -H, --host <ADDR>          Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>          Port to listen on [default: 3000]
    -c, --config <FILE>        Path to configuration file (JSON)
    -k, --token <TOKEN[=USER]> Accept a bearer token for USER [default user: 1]
                               (repeatable; enables authentication)
    -l, --log-level <LVL>      Log level (error, warn, info, debug, trace)
        --no-auth              Disable authentication
    -h, --help                 Print help
    -V, --version              Print version

ENVIRONMENT VARIABLES:
    WEBTERM_HOST               Host address (overrides config)
    WEBTERM_PORT               Port number (overrides config)
    WEBTERM_TOKEN              Token grant TOKEN[=USER] (overrides config)
    WEBTERM_LOG_LEVEL          Log level (overrides config)
    WEBTERM_SESSION_TTL        Session lifetime in seconds [default: 3600]
    WEBTERM_COMMAND_TIMEOUT    Per-command timeout in seconds [default: 30]
    RUST_LOG                   Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:3000, no auth, everyone is user 1)
    webterm

    # Two users on all interfaces
    webterm -H 0.0.0.0 -p 8080 -k alice-token=1 -k bob-token=2

    # Start with config file
    webterm -c /etc/webterm/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("webterm {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("webterm")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert_eq!(result.host, None);
        assert_eq!(result.port, None);
        assert!(result.tokens.is_empty());
        assert!(!result.no_auth);
    }

    #[test]
    fn test_host_port() {
        let result = parse_args_from(args(&["-H", "0.0.0.0", "-p", "8080"])).unwrap();
        assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
        assert_eq!(result.port, Some(8080));
    }

    #[test]
    fn test_long_options() {
        let result =
            parse_args_from(args(&["--host", "192.168.1.1", "--port", "9000"])).unwrap();
        assert_eq!(result.host.unwrap().to_string(), "192.168.1.1");
        assert_eq!(result.port, Some(9000));
    }

    #[test]
    fn test_tokens_repeatable() {
        let result = parse_args_from(args(&["-k", "alpha", "--token", "beta=2"])).unwrap();
        assert_eq!(
            result.tokens,
            vec![
                ("alpha".to_string(), UserId::new(1)),
                ("beta".to_string(), UserId::new(2)),
            ]
        );
    }

    #[test]
    fn test_invalid_token_user() {
        let result = parse_args_from(args(&["-k", "alpha=bob"]));
        assert!(matches!(result, Err(ArgsError::InvalidValue("token", _))));
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/config.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/config.json")));
    }

    #[test]
    fn test_no_auth() {
        let result = parse_args_from(args(&["--no-auth"])).unwrap();
        assert!(result.no_auth);
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["--help"])).unwrap();
        assert!(result.help);
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);

        let result = parse_args_from(args(&["--version"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_invalid_port() {
        let result = parse_args_from(args(&["-p", "invalid"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_host() {
        let result = parse_args_from(args(&["-H", "not-an-ip"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_unexpected_positional() {
        let result = parse_args_from(args(&["serve"]));
        assert!(matches!(result, Err(ArgsError::UnexpectedArgument(_))));
    }

    #[test]
    fn test_combined_options() {
        let result = parse_args_from(args(&[
            "-H",
            "0.0.0.0",
            "-p",
            "8080",
            "-k",
            "secret=4",
            "-l",
            "debug",
        ]))
        .unwrap();

        assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
        assert_eq!(result.port, Some(8080));
        assert_eq!(result.tokens, vec![("secret".to_string(), UserId::new(4))]);
        assert_eq!(result.log_level, Some("debug".to_string()));
        assert!(!result.no_auth);
    }
}
