//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use ridewatch_core::Slot;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a single ride.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideOutput {
    pub id: String,
    pub exam_type: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<u32>,
    pub starts_at: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(serialize_with = "serialize_datetime")]
    pub first_seen: DateTime<Utc>,
    #[serde(serialize_with = "serialize_datetime")]
    pub last_seen: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub absent_since: Option<DateTime<Utc>>,
}

impl From<&Slot> for RideOutput {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id.as_str().to_string(),
            exam_type: slot.exam_type.as_str().to_string(),
            location: slot.location.clone(),
            location_id: slot.location_id,
            starts_at: slot.starts_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            name: slot.name.clone(),
            cost: slot.cost.clone(),
            first_seen: slot.first_seen,
            last_seen: slot.last_seen,
            absent_since: slot.absent_since,
        }
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a ride list as an array.
    pub fn format_rides(&self, rides: &[Slot]) -> Result<String> {
        let outputs: Vec<RideOutput> = rides.iter().map(RideOutput::from).collect();
        self.format(&outputs)
    }

    /// Formats a single ride, or `null`.
    pub fn format_ride(&self, ride: Option<&Slot>) -> Result<String> {
        self.format(&ride.map(RideOutput::from))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_missing_ride_is_null() {
        let formatter = JsonFormatter::new(false);
        assert_eq!(formatter.format_ride(None).unwrap(), "null");
    }
}
