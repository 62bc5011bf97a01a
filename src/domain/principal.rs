//! Authenticated identities and the per-connection session handle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric principal id as issued by the job server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u32);

impl UserId {
    /// Wraps a raw uid.
    #[must_use]
    pub const fn new(uid: u32) -> Self {
        Self(uid)
    }

    /// Returns the raw uid.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UserId {
    fn from(uid: u32) -> Self {
        Self(uid)
    }
}

/// Permission class of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sees every event regardless of ownership or targeting.
    Admin,
    /// Sees only events addressed to, or owned by, itself.
    User,
}

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Primary uid used for ownership checks.
    pub uid: UserId,
    /// Login name.
    pub name: String,
    /// Permission class.
    pub role: Role,
}

impl Principal {
    /// Creates a principal.
    #[must_use]
    pub fn new(uid: u32, name: impl Into<String>, role: Role) -> Self {
        Self {
            uid: UserId::new(uid),
            name: name.into(),
            role,
        }
    }

    /// Returns `true` for administrator principals.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&Principal> for UserId {
    fn from(principal: &Principal) -> Self {
        principal.uid
    }
}

/// Session handle attached to a connection after a successful login.
///
/// A connection without a session is unauthenticated.
#[derive(Debug, Clone)]
pub struct Session {
    principal: Principal,
    logged_in_at: DateTime<Utc>,
}

impl Session {
    /// Opens a session for `principal`.
    #[must_use]
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            logged_in_at: Utc::now(),
        }
    }

    /// The principal this session belongs to.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Shorthand for the principal's primary uid.
    #[must_use]
    pub fn primary_uid(&self) -> UserId {
        self.principal.uid
    }

    /// When the login happened.
    #[must_use]
    pub fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }
}
