//! Snapshot diffing.

use ridewatch_core::{DiffResult, Slot};
use std::collections::HashSet;

/// Computes `added = fetched - known` and `removed = known - fetched` by identity.
///
/// Duplicate identities in `fetched` are reported once.
pub fn compute_diff(fetched: &[Slot], known: &[Slot]) -> DiffResult {
    let known_ids: HashSet<_> = known.iter().map(|s| &s.id).collect();
    let fetched_ids: HashSet<_> = fetched.iter().map(|s| &s.id).collect();

    let mut seen = HashSet::new();
    let added = fetched
        .iter()
        .filter(|s| !known_ids.contains(&s.id) && seen.insert(&s.id))
        .cloned()
        .collect();

    let removed = known
        .iter()
        .filter(|s| !fetched_ids.contains(&s.id))
        .map(|s| s.id.clone())
        .collect();

    DiffResult { added, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use ridewatch_core::ExamType;

    fn slot(at: &str) -> Slot {
        let starts_at = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap();
        Slot::new(ExamType::Korprov, "Farsta", starts_at)
    }

    #[test]
    fn test_added_and_removed() {
        let a = slot("2025-06-20 08:00");
        let b = slot("2025-06-20 09:00");
        let c = slot("2025-06-20 10:00");

        let diff = compute_diff(&[b.clone(), c.clone()], &[a.clone(), b]);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].id, c.id);
        assert_eq!(diff.removed, vec![a.id]);
    }

    #[test]
    fn test_identical_snapshots_are_empty() {
        let a = slot("2025-06-20 08:00");
        assert!(compute_diff(&[a.clone()], &[a]).is_empty());
    }

    #[test]
    fn test_duplicates_in_fetch_are_added_once() {
        let a = slot("2025-06-20 08:00");
        let diff = compute_diff(&[a.clone(), a], &[]);
        assert_eq!(diff.added.len(), 1);
    }

    #[test]
    fn test_everything_removed_on_empty_fetch() {
        let a = slot("2025-06-20 08:00");
        let b = slot("2025-06-20 09:00");
        let diff = compute_diff(&[], &[a, b]);
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed.len(), 2);
    }
}
