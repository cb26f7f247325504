//! User and session identifier types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resolved identity of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(UserId)
    }
}

/// Identifier of a terminal session.
///
/// Derived from the owning user, so a user can hold at most one session at a
/// time. Displayed as `user_<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(UserId);

impl SessionId {
    /// The session id owned by `user`.
    pub fn for_user(user: UserId) -> Self {
        Self(user)
    }

    /// The user this session belongs to.
    pub fn user(&self) -> UserId {
        self.0
    }
}

impl From<UserId> for SessionId {
    fn from(user: UserId) -> Self {
        Self::for_user(user)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_id_is_deterministic() {
        let a = SessionId::for_user(UserId::new(42));
        let b = SessionId::for_user(UserId::new(42));
        assert_eq!(a, b);
        assert_eq!(a.user(), UserId::new(42));
    }

    #[test]
    fn test_display_format() {
        let id = SessionId::for_user(UserId::new(7));
        assert_eq!(id.to_string(), "user_7");
    }

    #[test]
    fn test_user_id_parse() {
        let user: UserId = " 12 ".parse().unwrap();
        assert_eq!(user.as_u64(), 12);
        assert!("abc".parse::<UserId>().is_err());
        assert!("".parse::<UserId>().is_err());
    }

    #[test]
    fn test_hash_eq() {
        let mut set = HashSet::new();
        set.insert(SessionId::from(UserId::new(1)));
        assert!(set.contains(&SessionId::from(UserId::new(1))));
        assert!(!set.contains(&SessionId::from(UserId::new(2))));
    }
}
