//! Case-insensitive event name filter.

use regex::{Regex, RegexBuilder};

use crate::error::GatewayError;

/// Default filter: package, file, interaction and linkcheck events.
pub const DEFAULT_EVENT_PATTERN: &str = r"^(package|file|interaction|linkcheck)";

/// Compiled pattern searched (not anchored unless the pattern says so)
/// against event names.
#[derive(Debug, Clone)]
pub struct EventFilter {
    regex: Regex,
}

impl EventFilter {
    /// Compiles `pattern` case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPattern`] if `pattern` is not a valid
    /// regular expression.
    pub fn new(pattern: &str) -> Result<Self, GatewayError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex })
    }

    /// Returns `true` if the filter matches anywhere in `event_name`.
    #[must_use]
    pub fn matches(&self, event_name: &str) -> bool {
        self.regex.is_match(event_name)
    }

    /// The source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            regex: default_regex(),
        }
    }
}

#[allow(clippy::expect_used)]
fn default_regex() -> Regex {
    // Constant pattern, covered by tests.
    RegexBuilder::new(DEFAULT_EVENT_PATTERN)
        .case_insensitive(true)
        .build()
        .expect("default event pattern compiles")
}
