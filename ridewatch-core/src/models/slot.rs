//! Slot types.
//!
//! A slot ("ride") is one bookable examination appointment. Its identity is
//! a SHA-256 digest over the normalized location, the start time and the
//! examination type, so the same appointment maps to the same [`SlotId`]
//! on every poll.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

use super::exam::ExamType;

/// Format used for start times in identities and storage.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

// ============================================================================
// Slot Identity
// ============================================================================

/// Stable identity of a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    /// Derives the identity of the slot at `location` starting at `starts_at`.
    ///
    /// Location names are trimmed, whitespace-collapsed and lowercased
    /// before hashing.
    pub fn derive(exam_type: ExamType, location: &str, starts_at: NaiveDateTime) -> Self {
        let location = normalize_location(location);
        let input = format!(
            "v1|{}|{}|{}",
            exam_type.service_id(),
            location,
            starts_at.format(START_TIME_FORMAT)
        );

        let hash = digest(&SHA256, input.as_bytes());
        let mut hex = String::with_capacity(64);
        for byte in hash.as_ref() {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Wraps an identity read back from storage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_location(location: &str) -> String {
    location
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ============================================================================
// Slot
// ============================================================================

/// One observed examination slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Stable identity.
    pub id: SlotId,
    /// Examination type.
    pub exam_type: ExamType,
    /// Location name as reported by the service.
    pub location: String,
    /// Location id at the service, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<u32>,
    /// Local start date and time.
    pub starts_at: NaiveDateTime,
    /// Occasion name (e.g. "Körprov B").
    #[serde(default)]
    pub name: String,
    /// Price as displayed by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    /// Raw record as returned by the service.
    #[serde(default)]
    pub raw: serde_json::Value,
    /// When the slot was first observed.
    pub first_seen: DateTime<Utc>,
    /// When the slot was last reported.
    pub last_seen: DateTime<Utc>,
    /// When the slot stopped being reported (logical deletion).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absent_since: Option<DateTime<Utc>>,
}

impl Slot {
    /// Creates a newly observed slot.
    pub fn new(exam_type: ExamType, location: impl Into<String>, starts_at: NaiveDateTime) -> Self {
        let location = location.into();
        let now = Utc::now();
        Self {
            id: SlotId::derive(exam_type, &location, starts_at),
            exam_type,
            location,
            location_id: None,
            starts_at,
            name: String::new(),
            cost: None,
            raw: serde_json::Value::Null,
            first_seen: now,
            last_seen: now,
            absent_since: None,
        }
    }

    /// Sets the location id.
    pub fn with_location_id(mut self, id: u32) -> Self {
        self.location_id = Some(id);
        self
    }

    /// Sets the occasion name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the displayed price.
    pub fn with_cost(mut self, cost: impl Into<String>) -> Self {
        self.cost = Some(cost.into());
        self
    }

    /// Attaches the raw service record.
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    /// Returns true if the slot is no longer reported.
    pub fn is_absent(&self) -> bool {
        self.absent_since.is_some()
    }

    /// Returns the local date of the slot.
    pub fn date(&self) -> NaiveDate {
        self.starts_at.date()
    }

    /// One-line summary, e.g. `Körprov B, 2025-06-20 08:15 in Farsta for 800 kr`.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}, {} in {}",
            if self.name.is_empty() {
                self.exam_type.display_name()
            } else {
                &self.name
            },
            self.starts_at.format(START_TIME_FORMAT),
            self.location
        );
        if let Some(ref cost) = self.cost {
            line.push_str(" for ");
            line.push_str(cost);
        }
        line
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, START_TIME_FORMAT).unwrap()
    }

    #[test]
    fn test_identity_is_hex_sha256() {
        let id = SlotId::derive(ExamType::Korprov, "Farsta", at("2025-06-20 08:15"));
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id.short().len(), 12);
    }

    #[test]
    fn test_identity_normalizes_location() {
        let a = SlotId::derive(ExamType::Korprov, "Stockholm  Farsta", at("2025-06-20 08:15"));
        let b = SlotId::derive(ExamType::Korprov, " stockholm farsta ", at("2025-06-20 08:15"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_distinguishes_fields() {
        let base = SlotId::derive(ExamType::Korprov, "Farsta", at("2025-06-20 08:15"));
        assert_ne!(base, SlotId::derive(ExamType::Kunskapsprov, "Farsta", at("2025-06-20 08:15")));
        assert_ne!(base, SlotId::derive(ExamType::Korprov, "Sollentuna", at("2025-06-20 08:15")));
        assert_ne!(base, SlotId::derive(ExamType::Korprov, "Farsta", at("2025-06-20 08:30")));
    }

    #[test]
    fn test_slot_builder() {
        let slot = Slot::new(ExamType::Korprov, "Farsta", at("2025-06-20 08:15"))
            .with_location_id(1000140)
            .with_name("Körprov B")
            .with_cost("800 kr");

        assert_eq!(slot.location_id, Some(1000140));
        assert!(!slot.is_absent());
        assert_eq!(slot.date(), NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
        assert_eq!(slot.summary(), "Körprov B, 2025-06-20 08:15 in Farsta for 800 kr");
    }

    #[test]
    fn test_summary_without_name_uses_exam() {
        let slot = Slot::new(ExamType::Kunskapsprov, "Farsta", at("2025-06-20 08:15"));
        assert_eq!(slot.summary(), "Kunskapsprov, 2025-06-20 08:15 in Farsta");
    }
}
