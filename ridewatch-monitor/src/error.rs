//! Loop-level errors.

use chrono::{DateTime, Utc};
use ridewatch_fetch::SessionError;
use ridewatch_store::StoreError;
use thiserror::Error;

/// A condition that terminates the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The session could not be kept alive; fresh cookies are needed.
    #[error("Session expired: {source}")]
    SessionExpired {
        /// Underlying session error.
        source: SessionError,
        /// Last completed poll cycle.
        last_poll: Option<DateTime<Utc>>,
    },

    /// The ride store could not be read or written.
    #[error("Ride store unavailable: {source}")]
    StoreUnavailable {
        /// Underlying store error.
        source: StoreError,
        /// Last completed poll cycle.
        last_poll: Option<DateTime<Utc>>,
    },
}

impl MonitorError {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionExpired { .. } => "session_expired",
            Self::StoreUnavailable { .. } => "store_unavailable",
        }
    }

    /// Returns true if new cookies would fix this.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Last completed poll cycle before the failure.
    pub fn last_poll(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::SessionExpired { last_poll, .. } | Self::StoreUnavailable { last_poll, .. } => {
                *last_poll
            }
        }
    }

    /// Last successful session renewal, when known.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::SessionExpired {
                source: SessionError::Expired { last_refresh, .. },
                ..
            } => *last_refresh,
            _ => None,
        }
    }
}
