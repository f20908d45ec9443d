//! Configuration management.

use chrono::NaiveDate;
use ridewatch_core::{CoreError, ExamType};
use ridewatch_fetch::{CookieMap, RetryPolicy, SessionConfig, SlotFilters};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_config_path, default_database_path, load_json, save_json};

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;

/// Longest accepted retention for absent rides.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Subject identifier (personal identity number).
    #[serde(default)]
    pub ssn: String,
    /// Session cookies as captured from a logged-in browser.
    #[serde(default)]
    pub cookies: CookieMap,
    /// Examination type to monitor.
    #[serde(default = "default_exam_type")]
    pub exam_type: ExamType,
    /// Remote location ids polled every cycle.
    #[serde(default)]
    pub location_ids: Vec<u32>,
    /// Location name filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Earliest date of interest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    /// Latest date of interest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Seconds between background session checks.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Remaining validity (seconds) below which the session is renewed.
    #[serde(default = "default_safety_margin")]
    pub safety_margin_secs: u64,
    /// Days an absent ride is kept before pruning.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Retry policy for renewal and fetch.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Ride database location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// User agent sent to the booking service.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_exam_type() -> ExamType {
    ExamType::Korprov
}

fn default_poll_interval() -> u64 {
    1200
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_safety_margin() -> u64 {
    900
}

fn default_retention_days() -> u32 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssn: String::new(),
            cookies: CookieMap::new(),
            exam_type: default_exam_type(),
            location_ids: Vec::new(),
            location: None,
            date_from: None,
            date_to: None,
            poll_interval_secs: default_poll_interval(),
            refresh_interval_secs: default_refresh_interval(),
            safety_margin_secs: default_safety_margin(),
            retention_days: default_retention_days(),
            retry: RetryPolicy::default(),
            database_path: None,
            user_agent: default_user_agent(),
        }
    }
}

// Cookie values and the SSN never end up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ssn", &if self.ssn.is_empty() { "<unset>" } else { "<set>" })
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .field("exam_type", &self.exam_type)
            .field("location_ids", &self.location_ids)
            .field("location", &self.location)
            .field("date_from", &self.date_from)
            .field("date_to", &self.date_to)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("safety_margin_secs", &self.safety_margin_secs)
            .field("retention_days", &self.retention_days)
            .field("retry", &self.retry)
            .field("database_path", &self.database_path)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from a path, or defaults if the file does not exist.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !tokio::fs::try_exists(path).await? {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config: Config = load_json(path).await?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to a path (atomic, owner-only).
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks the values the monitor depends on.
    pub fn validate(&self) -> Result<(), CoreError> {
        let digits: String = self.ssn.chars().filter(|c| *c != '-').collect();
        if digits.is_empty() {
            return Err(CoreError::InvalidConfig("ssn is not set".to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) || !matches!(digits.len(), 10 | 12) {
            return Err(CoreError::InvalidConfig(
                "ssn must be 10 or 12 digits".to_string(),
            ));
        }

        if self.location_ids.is_empty() {
            return Err(CoreError::InvalidConfig(
                "at least one location id is required".to_string(),
            ));
        }

        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            return Err(CoreError::InvalidConfig(format!(
                "poll_interval_secs must be at least {MIN_POLL_INTERVAL_SECS}"
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "refresh_interval_secs must be positive".to_string(),
            ));
        }
        if self.safety_margin_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "safety_margin_secs must be positive".to_string(),
            ));
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
            return Err(CoreError::InvalidConfig(format!(
                "retention_days must be between 1 and {MAX_RETENTION_DAYS}"
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(CoreError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(CoreError::InvalidConfig(format!(
                    "date_from {from} is after date_to {to}"
                )));
            }
        }

        Ok(())
    }

    /// Slot filters derived from the location and date settings.
    pub fn filters(&self) -> SlotFilters {
        SlotFilters {
            location_ids: self.location_ids.clone(),
            location: self.location.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }

    /// Session manager settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            safety_margin: Duration::from_secs(self.safety_margin_secs),
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
            retry: self.retry.clone(),
        }
    }

    /// Poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Retention threshold for absent rides.
    pub fn retention(&self) -> chrono::Duration {
        Self::retention_for(self.retention_days)
    }

    /// Retention threshold for a day count.
    pub fn retention_for(days: u32) -> chrono::Duration {
        chrono::Duration::days(i64::from(days))
    }

    /// Ride database path, falling back to the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_database_path)
    }

    /// Replaces cookies with newer values, keeping names not in `cookies`.
    pub fn merge_cookies(&mut self, cookies: &CookieMap) {
        for (name, value) in cookies {
            self.cookies.insert(name.clone(), value.clone());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
