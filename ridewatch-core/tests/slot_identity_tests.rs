//! Integration tests for slot identity stability.

use chrono::NaiveDateTime;
use ridewatch_core::{ExamType, Slot, SlotId};
use std::collections::HashSet;

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

#[test]
fn test_identity_stable_across_polls() {
    // Two polls produce independently constructed slots for the same occasion.
    let first = Slot::new(ExamType::Korprov, "Farsta", at("2025-06-20 08:15")).with_cost("800 kr");
    let second = Slot::new(ExamType::Korprov, "Farsta", at("2025-06-20 08:15")).with_cost("900 kr");

    assert_eq!(first.id, second.id);
    assert_eq!(
        first.id,
        SlotId::derive(ExamType::Korprov, "Farsta", at("2025-06-20 08:15"))
    );
}

#[test]
fn test_no_collisions_over_a_day_of_slots() {
    let mut ids = HashSet::new();
    for location in ["Farsta", "Sollentuna", "Södertälje"] {
        for exam in ExamType::all() {
            for hour in 7..18 {
                for minute in [0, 15, 30, 45] {
                    let starts_at = at(&format!("2025-06-20 {hour:02}:{minute:02}"));
                    assert!(ids.insert(SlotId::derive(*exam, location, starts_at)));
                }
            }
        }
    }
    assert_eq!(ids.len(), 3 * 2 * 11 * 4);
}
