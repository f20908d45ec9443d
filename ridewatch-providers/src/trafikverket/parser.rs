//! Response parsing for the occasion-bundles endpoint.

use chrono::NaiveDateTime;
use regex::Regex;
use ridewatch_core::{ExamType, Slot};
use ridewatch_fetch::{ApiError, RejectedRecord, SlotBatch};
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Body fragments the service uses when the login is gone.
static SESSION_EXPIRED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)session.*expired|login.*required|unauthorized|nullreferenceexception")
        .expect("Invalid regex")
});

// ============================================================================
// Response Types
// ============================================================================

/// Top-level response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    bundles: Option<Vec<Value>>,
}

/// The first occasion of a bundle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Occasion {
    date: String,
    time: String,
    location_name: String,
    #[serde(default)]
    location_id: Option<u32>,
    #[serde(default)]
    cost: Option<Value>,
    #[serde(default)]
    name: Option<String>,
}

// ============================================================================
// Classification
// ============================================================================

/// Returns true if the body looks like an expired-session page.
pub fn is_session_expired_body(body: &str) -> bool {
    SESSION_EXPIRED_RE.is_match(body)
}

/// Maps a non-success HTTP response to an error. Returns `Ok(())` for 200.
pub fn check_status(status: u16, body: &str, retry_after: Option<u64>) -> Result<(), ApiError> {
    match status {
        200 => Ok(()),
        401 | 403 => Err(ApiError::AuthenticationFailed(format!("HTTP {status}"))),
        429 => Err(ApiError::RateLimited { retry_after }),
        500..=599 => Err(ApiError::Transient(format!("HTTP {status}"))),
        _ if is_session_expired_body(body) => Err(ApiError::AuthenticationFailed(format!(
            "HTTP {status} with session-expired body"
        ))),
        _ => Err(ApiError::Malformed(format!("unexpected HTTP {status}"))),
    }
}

fn rejected_envelope(body: &str, detail: String) -> ApiError {
    if is_session_expired_body(body) {
        ApiError::AuthenticationFailed(detail)
    } else {
        ApiError::Malformed(detail)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses an occasion-bundles response body.
///
/// Each bundle's first occasion becomes one slot. Bundles that do not parse
/// are returned as rejections instead of failing the whole batch.
pub fn parse_bundles(body: &str, exam_type: ExamType, location_id: u32) -> Result<SlotBatch, ApiError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| rejected_envelope(body, format!("JSON parse error: {e}")))?;

    match envelope.status {
        Some(200) => {}
        Some(status) => {
            return Err(rejected_envelope(body, format!("envelope status {status}")));
        }
        None => return Err(rejected_envelope(body, "envelope has no status".to_string())),
    }

    let bundles = envelope
        .data
        .and_then(|d| d.bundles)
        .ok_or_else(|| ApiError::Malformed("envelope has no bundles".to_string()))?;

    let mut batch = SlotBatch::default();
    for (index, bundle) in bundles.iter().enumerate() {
        match parse_bundle(bundle, exam_type, location_id) {
            Ok(slot) => batch.slots.push(slot),
            Err(reason) => {
                warn!(location_id, index, reason = %reason, "Skipping malformed bundle");
                batch.rejected.push(RejectedRecord {
                    location_id: Some(location_id),
                    reason: format!("bundle {index}: {reason}"),
                });
            }
        }
    }

    debug!(
        location_id,
        slots = batch.slots.len(),
        rejected = batch.rejected.len(),
        "Parsed occasion bundles"
    );
    Ok(batch)
}

fn parse_bundle(bundle: &Value, exam_type: ExamType, location_id: u32) -> Result<Slot, String> {
    let first = bundle
        .get("occasions")
        .and_then(Value::as_array)
        .and_then(|occasions| occasions.first())
        .ok_or("no occasions")?;

    let occasion: Occasion =
        serde_json::from_value(first.clone()).map_err(|e| format!("bad occasion: {e}"))?;

    let starts_at = parse_start(&occasion.date, &occasion.time)
        .ok_or_else(|| format!("bad date/time {:?} {:?}", occasion.date, occasion.time))?;

    if occasion.location_name.trim().is_empty() {
        return Err("empty location name".to_string());
    }

    let mut slot = Slot::new(exam_type, occasion.location_name.trim(), starts_at)
        .with_location_id(occasion.location_id.unwrap_or(location_id))
        .with_raw(first.clone());

    if let Some(name) = occasion.name {
        slot = slot.with_name(name);
    }
    if let Some(cost) = occasion.cost.as_ref().and_then(cost_text) {
        slot = slot.with_cost(cost);
    }

    Ok(slot)
}

/// Parses `date` (`YYYY-MM-DD`, optionally with a time part) and `time` (`HH:MM[:SS]`).
fn parse_start(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = date.trim().get(..10)?;
    let time = time.trim();
    let combined = format!("{date} {time}");

    ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&combined, format).ok())
}

fn cost_text(cost: &Value) -> Option<String> {
    match cost {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
