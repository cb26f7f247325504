//! Security module for webterm.
//!
//! Every terminal operation needs a resolved caller identity. Identities
//! come from bearer tokens mapped to user ids.
//!
//! ## Example
//!
//! ```rust
//! use webterm::security::{AuthConfig, TokenRegistry};
//! use webterm::session::UserId;
//!
//! let registry = TokenRegistry::new(AuthConfig::default());
//! registry.grant("my-secret-token", UserId::new(7))?;
//!
//! assert_eq!(
//!     registry.authenticate(Some("Bearer my-secret-token"), None)?,
//!     Some(UserId::new(7))
//! );
//! # Ok::<(), webterm::TerminalError>(())
//! ```

pub mod auth;

// Re-export commonly used types
pub use auth::{parse_token_grant, AuthConfig, Caller, TokenRegistry, Unauthorized};
