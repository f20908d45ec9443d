//! Remote service boundary.
//!
//! The monitor and the session manager only see these traits. The concrete
//! booking adapter lives in `ridewatch-providers`; tests use fakes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ridewatch_core::{ExamType, Session, Slot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApiError;

// ============================================================================
// Filters
// ============================================================================

/// Which slots a fetch should return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFilters {
    /// Remote location ids to query. Each id is one request.
    #[serde(default)]
    pub location_ids: Vec<u32>,
    /// Location name filter (case-insensitive substring).
    #[serde(default)]
    pub location: Option<String>,
    /// Earliest date, inclusive.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Latest date, inclusive.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl SlotFilters {
    /// Returns true if the slot passes the name and date filters.
    pub fn matches(&self, slot: &Slot) -> bool {
        let date = slot.date();
        if self.date_from.is_some_and(|from| date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| date > to) {
            return false;
        }
        match &self.location {
            Some(name) if !name.trim().is_empty() => slot
                .location
                .to_lowercase()
                .contains(&name.trim().to_lowercase()),
            _ => true,
        }
    }
}

// ============================================================================
// Fetch Results
// ============================================================================

/// A record the adapter could not turn into a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Location the record came from.
    pub location_id: Option<u32>,
    /// Why it was rejected.
    pub reason: String,
}

/// Result of one fetch: the good slots plus per-record rejections.
#[derive(Debug, Clone, Default)]
pub struct SlotBatch {
    /// Parsed slots.
    pub slots: Vec<Slot>,
    /// Records that failed to parse.
    pub rejected: Vec<RejectedRecord>,
}

impl SlotBatch {
    /// Appends another batch.
    pub fn extend(&mut self, other: SlotBatch) {
        self.slots.extend(other.slots);
        self.rejected.extend(other.rejected);
    }

    /// Drops slots that fail the filters.
    pub fn retain_matching(&mut self, filters: &SlotFilters) {
        self.slots.retain(|slot| filters.matches(slot));
    }
}

/// Cookies returned by a successful renewal request.
#[derive(Debug, Clone, Default)]
pub struct Renewal {
    /// Cookies to merge into the session.
    pub cookies: BTreeMap<String, String>,
    /// Earliest `expires=` attribute seen on the returned cookies.
    pub expires_hint: Option<DateTime<Utc>>,
}

// ============================================================================
// Traits
// ============================================================================

/// Fetches slots from the booking service.
#[async_trait]
pub trait SlotSource: Send + Sync {
    /// Identifier used in logs.
    fn id(&self) -> &str;

    /// Fetches the current slots for an examination type.
    ///
    /// Idempotent; never mutates the session.
    async fn fetch_slots(
        &self,
        session: &Session,
        exam_type: ExamType,
        filters: &SlotFilters,
    ) -> Result<SlotBatch, ApiError>;
}

/// Renews the login on the booking service.
#[async_trait]
pub trait SessionRenewer: Send + Sync {
    /// Issues one refresh request with the current cookies.
    async fn renew(&self, session: &Session) -> Result<Renewal, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn slot(location: &str, at: &str) -> Slot {
        let starts_at = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap();
        Slot::new(ExamType::Korprov, location, starts_at)
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert!(SlotFilters::default().matches(&slot("Farsta", "2025-06-20 08:15")));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filters = SlotFilters {
            date_from: NaiveDate::from_ymd_opt(2025, 6, 20),
            date_to: NaiveDate::from_ymd_opt(2025, 6, 21),
            ..Default::default()
        };

        assert!(filters.matches(&slot("Farsta", "2025-06-20 08:15")));
        assert!(filters.matches(&slot("Farsta", "2025-06-21 16:00")));
        assert!(!filters.matches(&slot("Farsta", "2025-06-19 23:59")));
        assert!(!filters.matches(&slot("Farsta", "2025-06-22 00:00")));
    }

    #[test]
    fn test_location_filter_is_case_insensitive() {
        let filters = SlotFilters {
            location: Some("farsta".into()),
            ..Default::default()
        };

        assert!(filters.matches(&slot("Stockholm Farsta", "2025-06-20 08:15")));
        assert!(!filters.matches(&slot("Uppsala", "2025-06-20 08:15")));
    }
}
