//! Session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

// ============================================================================
// Session
// ============================================================================

/// Authenticated session of one account.
///
/// `expires_at` is always derived from `cookies`; a session is valid while
/// the remaining time exceeds the caller's safety margin.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Subject identifier (personal identity number).
    pub subject: String,
    /// Cookie name to value.
    pub cookies: BTreeMap<String, String>,
    /// When the server considers the login expired.
    pub expires_at: DateTime<Utc>,
    /// Incremented on every accepted renewal.
    pub generation: u64,
}

impl Session {
    /// Creates a session from an accepted cookie set.
    pub fn new(
        subject: impl Into<String>,
        cookies: BTreeMap<String, String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            cookies,
            expires_at,
            generation: 0,
        }
    }

    /// Time left until expiry (negative once expired).
    pub fn remaining_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.expires_at.signed_duration_since(now)
    }

    /// Returns true if the session stays valid for at least `margin` after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::MAX);
        self.remaining_at(now) > margin
    }

    /// Returns true if the session stays valid for at least `margin` from now.
    pub fn is_valid(&self, margin: Duration) -> bool {
        self.is_valid_at(Utc::now(), margin)
    }

    /// Builds a `Cookie` request header value.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Subject with all but the last four characters masked.
    pub fn masked_subject(&self) -> String {
        let chars: Vec<char> = self.subject.chars().collect();
        let visible = chars.len().saturating_sub(4);
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < visible && c.is_ascii_alphanumeric() { '*' } else { *c })
            .collect()
    }
}

// Cookie values and the subject are credentials; keep them out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("subject", &self.masked_subject())
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .field("expires_at", &self.expires_at)
            .field("generation", &self.generation)
            .finish()
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Lifecycle state of the managed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Usable, trusted until the next validity check.
    #[default]
    Fresh,
    /// A renewal request is in flight.
    Renewing,
    /// Renewal failed for good; new cookies must be supplied.
    Invalid,
}

impl SessionState {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "Fresh",
            Self::Renewing => "Renewing",
            Self::Invalid => "Invalid",
        }
    }

    /// Returns true for the terminal state.
    pub fn is_terminal(&self) -> bool {
        *self == Self::Invalid
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_in_minutes: i64) -> Session {
        let mut cookies = BTreeMap::new();
        cookies.insert("ASP.NET_SessionId".to_string(), "abc".to_string());
        cookies.insert("LoginValid".to_string(), "2025-06-20 16:48".to_string());
        Session::new(
            "199001011234",
            cookies,
            Utc::now() + chrono::Duration::minutes(expires_in_minutes),
        )
    }

    #[test]
    fn test_validity_against_margin() {
        let margin = Duration::from_secs(15 * 60);
        assert!(session(60).is_valid(margin));
        assert!(!session(10).is_valid(margin));
        assert!(!session(-5).is_valid(margin));
    }

    #[test]
    fn test_cookie_header_is_sorted_and_joined() {
        assert_eq!(
            session(60).cookie_header(),
            "ASP.NET_SessionId=abc; LoginValid=2025-06-20 16:48"
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", session(60));
        assert!(!debug.contains("abc"));
        assert!(!debug.contains("199001011234"));
        assert!(debug.contains("********1234"));
    }

    #[test]
    fn test_state_terminal() {
        assert!(SessionState::Invalid.is_terminal());
        assert!(!SessionState::Fresh.is_terminal());
        assert_eq!(SessionState::default(), SessionState::Fresh);
    }
}
