//! Serde format tests for core types.
//!
//! These pin the JSON shapes that leave the process: config files store
//! exam types, and the reporter prints change events as JSON lines.

use chrono::NaiveDateTime;

use crate::{ChangeEvent, ChangeKind, ExamType, Slot};

fn slot() -> Slot {
    let starts_at = NaiveDateTime::parse_from_str("2025-06-20 08:15", "%Y-%m-%d %H:%M").unwrap();
    Slot::new(ExamType::Korprov, "Farsta", starts_at)
        .with_name("Körprov B")
        .with_cost("800 kr")
}

// ============================================================================
// ExamType
// ============================================================================

#[test]
fn test_exam_type_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&ExamType::Korprov).unwrap(), r#""korprov""#);
    assert_eq!(
        serde_json::to_string(&ExamType::Kunskapsprov).unwrap(),
        r#""kunskapsprov""#
    );
}

#[test]
fn test_exam_type_invalid_deserialize() {
    let result: Result<ExamType, _> = serde_json::from_str(r#""motorcycle""#);
    assert!(result.is_err());
}

// ============================================================================
// ChangeEvent
// ============================================================================

#[test]
fn test_added_event_shape() {
    let event = ChangeEvent::added(slot());
    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(value["kind"], "added");
    assert_eq!(value["exam_type"], "korprov");
    assert_eq!(value["slot"]["location"], "Farsta");
    assert!(value.get("error_detail").is_none());
}

#[test]
fn test_heartbeat_event_omits_slot() {
    let event = ChangeEvent::heartbeat(ExamType::Kunskapsprov);
    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(value["kind"], "heartbeat");
    assert!(value.get("slot").is_none());
    assert!(event.slot_id().is_none());
}

#[test]
fn test_error_event_carries_detail() {
    let event = ChangeEvent::error(ExamType::Korprov, "bundle 3: missing date");
    assert_eq!(event.kind, ChangeKind::Error);

    let json = serde_json::to_string(&event).unwrap();
    let parsed: ChangeEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.error_detail.as_deref(), Some("bundle 3: missing date"));
}

#[test]
fn test_slot_id_serializes_transparently() {
    let slot = slot();
    let value = serde_json::to_value(&slot).unwrap();
    assert_eq!(value["id"], slot.id.as_str());
}
