//! Gateway configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::{AclMismatch, EventFilter, Role};
use crate::error::GatewayError;

/// Default push interval in seconds.
pub const DEFAULT_INTERVAL_SECS: f64 = 1.5;

/// A login account accepted by the bundled API layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Login name.
    pub name: String,
    /// Password compared on login.
    pub password: String,
    /// Permission class.
    pub role: Role,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Initial push interval for every new connection.
    pub push_interval: Duration,

    /// Initial event filter for every new connection.
    pub event_filter: EventFilter,

    /// Behavior when a non-admin client is excluded from an event.
    pub acl_mismatch: AclMismatch,

    /// Accounts, in uid order starting at 1.
    pub accounts: Vec<AccountConfig>,

    /// Bearer token for `POST /api/v1/events`; the route is off when unset.
    pub ingest_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            push_interval: Duration::from_secs_f64(DEFAULT_INTERVAL_SECS),
            event_filter: EventFilter::default(),
            acl_mismatch: AclMismatch::default(),
            accounts: Vec::new(),
            ingest_token: None,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if a variable is set to a value
    /// that cannot be parsed, and [`GatewayError::InvalidPattern`] for a
    /// bad `EVENT_PATTERN`.
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match env("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| GatewayError::Config(format!("LISTEN_ADDR `{raw}`: {e}")))?,
            None => defaults.listen_addr,
        };

        let push_interval = match env("PUSH_INTERVAL_SECS") {
            Some(raw) => parse_interval(&raw)?,
            None => defaults.push_interval,
        };

        let event_filter = match env("EVENT_PATTERN") {
            Some(raw) => EventFilter::new(&raw)?,
            None => defaults.event_filter,
        };

        let acl_mismatch = match env("ACL_MISMATCH") {
            Some(raw) => raw.parse()?,
            None => defaults.acl_mismatch,
        };

        let accounts = match env("GATEWAY_USERS") {
            Some(raw) => parse_accounts(&raw)?,
            None => defaults.accounts,
        };

        Ok(Self {
            listen_addr,
            push_interval,
            event_filter,
            acl_mismatch,
            accounts,
            ingest_token: env("EVENT_INGEST_TOKEN"),
        })
    }
}

/// Reads a non-empty environment variable.
fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses a positive, finite number of seconds.
///
/// # Errors
///
/// Returns [`GatewayError::Config`] for anything else.
pub fn parse_interval(raw: &str) -> Result<Duration, GatewayError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(seconds_to_duration)
        .ok_or_else(|| {
            GatewayError::Config(format!(
                "PUSH_INTERVAL_SECS must be a positive number up to {MAX_INTERVAL_SECS}, got `{raw}`"
            ))
        })
}

/// Longest accepted push interval, in seconds (one day).
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;

/// Converts positive finite seconds, at most [`MAX_INTERVAL_SECS`], to a
/// [`Duration`].
#[must_use]
pub fn seconds_to_duration(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 && secs <= MAX_INTERVAL_SECS {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// Parses `name:password[:admin]` entries separated by commas.
///
/// # Errors
///
/// Returns [`GatewayError::Config`] on a malformed entry or unknown role.
pub fn parse_accounts(raw: &str) -> Result<Vec<AccountConfig>, GatewayError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let (Some(name), Some(password)) = (parts.next(), parts.next()) else {
                return Err(GatewayError::Config(format!(
                    "GATEWAY_USERS entry `{entry}` must be name:password[:admin]"
                )));
            };
            let role = match parts.next() {
                None | Some("user") => Role::User,
                Some("admin") => Role::Admin,
                Some(other) => {
                    return Err(GatewayError::Config(format!(
                        "GATEWAY_USERS role `{other}` must be `admin` or `user`"
                    )));
                }
            };
            if name.is_empty() {
                return Err(GatewayError::Config(format!(
                    "GATEWAY_USERS entry `{entry}` has an empty name"
                )));
            }
            Ok(AccountConfig {
                name: name.to_string(),
                password: password.to_string(),
                role,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.push_interval, Duration::from_millis(1500));
        assert_eq!(cfg.acl_mismatch, AclMismatch::Skip);
        assert!(cfg.accounts.is_empty());
        assert!(cfg.ingest_token.is_none());
        assert!(cfg.event_filter.matches("linkcheck_finished"));
    }

    #[test]
    fn interval_parsing() {
        assert!(matches!(parse_interval("0.5"), Ok(d) if d == Duration::from_millis(500)));
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("-1").is_err());
        assert!(parse_interval("NaN").is_err());
        assert!(parse_interval("soon").is_err());
    }

    #[test]
    fn interval_is_capped() {
        assert_eq!(seconds_to_duration(MAX_INTERVAL_SECS), Some(Duration::from_secs(86_400)));
        assert_eq!(seconds_to_duration(MAX_INTERVAL_SECS + 1.0), None);
        assert_eq!(seconds_to_duration(1e19), None);
        assert_eq!(seconds_to_duration(f64::INFINITY), None);
        assert!(parse_interval("1e19").is_err());
    }

    #[test]
    fn accounts_parsing() {
        let Ok(accounts) = parse_accounts("root:toor:admin, alice:pw ,bob:secret:user") else {
            panic!("valid accounts");
        };
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts.first().map(|a| a.role), Some(Role::Admin));
        assert_eq!(accounts.get(1).map(|a| a.name.as_str()), Some("alice"));
        assert_eq!(accounts.get(1).map(|a| a.role), Some(Role::User));
    }

    #[test]
    fn accounts_reject_bad_entries() {
        assert!(parse_accounts("nopassword").is_err());
        assert!(parse_accounts(":pw").is_err());
        assert!(parse_accounts("alice:pw:superuser").is_err());
        assert!(matches!(parse_accounts(""), Ok(a) if a.is_empty()));
    }
}
