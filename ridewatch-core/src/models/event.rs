//! Change events and poll diffs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::exam::ExamType;
use super::slot::{Slot, SlotId};

// ============================================================================
// Diff Result
// ============================================================================

/// Delta between the known slots and one poll's snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    /// Slots reported now but not known before.
    pub added: Vec<Slot>,
    /// Known slots no longer reported.
    pub removed: Vec<SlotId>,
}

impl DiffResult {
    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

// ============================================================================
// Change Event
// ============================================================================

/// Kind of a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A new slot appeared.
    Added,
    /// A known slot disappeared.
    Removed,
    /// A cycle completed without changes.
    Heartbeat,
    /// A cycle-level error was absorbed.
    Error,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Heartbeat => "heartbeat",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Structured event for the reporting side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Event kind.
    pub kind: ChangeKind,
    /// Examination type being monitored.
    pub exam_type: ExamType,
    /// The slot concerned, for added/removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    /// Error description, for error events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// When the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    fn new(kind: ChangeKind, exam_type: ExamType) -> Self {
        Self {
            kind,
            exam_type,
            slot: None,
            error_detail: None,
            timestamp: Utc::now(),
        }
    }

    /// A slot appeared.
    pub fn added(slot: Slot) -> Self {
        let mut event = Self::new(ChangeKind::Added, slot.exam_type);
        event.slot = Some(slot);
        event
    }

    /// A slot disappeared.
    pub fn removed(slot: Slot) -> Self {
        let mut event = Self::new(ChangeKind::Removed, slot.exam_type);
        event.slot = Some(slot);
        event
    }

    /// Nothing changed this cycle.
    pub fn heartbeat(exam_type: ExamType) -> Self {
        Self::new(ChangeKind::Heartbeat, exam_type)
    }

    /// A cycle-level error.
    pub fn error(exam_type: ExamType, detail: impl Into<String>) -> Self {
        let mut event = Self::new(ChangeKind::Error, exam_type);
        event.error_detail = Some(detail.into());
        event
    }

    /// Identity of the slot concerned, if any.
    pub fn slot_id(&self) -> Option<&SlotId> {
        self.slot.as_ref().map(|s| &s.id)
    }
}
