//! Fetch and session error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// API Error
// ============================================================================

/// Error returned by the remote booking service boundary.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The service rejected the session.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before the next request.
        retry_after: Option<u64>,
    },

    /// Network failure or server-side error; worth retrying.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The response could not be understood; not worth retrying.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Short, stable name of the error kind for logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::RateLimited { .. } => "rate_limited",
            Self::Transient(_) => "transient",
            Self::Malformed(_) => "malformed",
        }
    }

    /// Returns true for network/5xx failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns true if the session was rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transient(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            ApiError::Transient(format!("Connection failed: {err}"))
        } else if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else {
            ApiError::Transient(err.to_string())
        }
    }
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Request(e) => e.into(),
            HttpError::Timeout => ApiError::Transient("Request timed out".to_string()),
            other => ApiError::Malformed(other.to_string()),
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header value (e.g. a cookie with control characters).
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Timeout.
    #[error("Request timed out")]
    Timeout,
}

// ============================================================================
// Session Error
// ============================================================================

/// Error type for session lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Supplied credentials are missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Renewal is exhausted; fresh cookies must be supplied externally.
    #[error("Session expired and could not be renewed after {attempts} attempt(s): {reason}")]
    Expired {
        /// Renewal attempts made before giving up (0 if already invalid).
        attempts: u32,
        /// Last failure seen.
        reason: String,
        /// Last successful renewal, if any.
        last_refresh: Option<DateTime<Utc>>,
    },
}

impl SessionError {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Expired { .. } => "session_expired",
        }
    }

    /// Returns true if the session ended up invalid.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ApiError::Transient("x".into()).kind(), "transient");
        assert_eq!(ApiError::RateLimited { retry_after: Some(5) }.kind(), "rate_limited");
        assert!(ApiError::AuthenticationFailed("x".into()).is_auth());
        assert!(!ApiError::Malformed("x".into()).is_transient());
    }

    #[test]
    fn test_http_error_mapping() {
        let err: ApiError = HttpError::Timeout.into();
        assert!(err.is_transient());

        let err: ApiError = HttpError::DomainNotAllowed("evil.com".into()).into();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_expired_message_mentions_attempts() {
        let err = SessionError::Expired {
            attempts: 3,
            reason: "Transient failure: 502".into(),
            last_refresh: None,
        };
        assert!(err.to_string().contains("after 3 attempt(s)"));
        assert!(err.is_expired());
        assert_eq!(SessionError::Configuration("x".into()).kind(), "configuration");
    }
}
