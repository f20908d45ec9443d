//! Event reporter.
//!
//! Drains the monitor's event channel and turns every [`ChangeEvent`] into a
//! log line. With [`ReportFormat::Json`] each event is also written to stdout
//! as one JSON object per line.

use ridewatch_core::{ChangeEvent, ChangeKind};
use serde::Serialize;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How events are surfaced besides logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Log lines only.
    #[default]
    Text,
    /// Log lines plus JSON lines on stdout.
    Json,
}

/// Event counts seen by a reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Added events.
    pub added: usize,
    /// Removed events.
    pub removed: usize,
    /// Heartbeats.
    pub heartbeats: usize,
    /// Error events.
    pub errors: usize,
}

impl ReportSummary {
    fn count(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Added => self.added += 1,
            ChangeKind::Removed => self.removed += 1,
            ChangeKind::Heartbeat => self.heartbeats += 1,
            ChangeKind::Error => self.errors += 1,
        }
    }
}

/// Logs a single event.
pub fn log_event(event: &ChangeEvent) {
    match event.kind {
        ChangeKind::Added => {
            if let Some(slot) = &event.slot {
                info!(
                    exam = %event.exam_type,
                    id = slot.id.short(),
                    location = %slot.location,
                    starts_at = %slot.starts_at,
                    "New ride available: {}",
                    slot.summary()
                );
            }
        }
        ChangeKind::Removed => {
            if let Some(slot) = &event.slot {
                info!(
                    exam = %event.exam_type,
                    id = slot.id.short(),
                    "Ride no longer available: {}",
                    slot.summary()
                );
            }
        }
        ChangeKind::Heartbeat => {
            debug!(exam = %event.exam_type, "No changes");
        }
        ChangeKind::Error => {
            warn!(
                exam = %event.exam_type,
                detail = event.error_detail.as_deref().unwrap_or(""),
                "Cycle error"
            );
        }
    }
}

/// Spawns a task that reports events until every sender is dropped.
pub fn spawn_reporter(
    mut events: mpsc::Receiver<ChangeEvent>,
    format: ReportFormat,
) -> JoinHandle<ReportSummary> {
    tokio::spawn(async move {
        let mut summary = ReportSummary::default();

        while let Some(event) = events.recv().await {
            summary.count(event.kind);
            log_event(&event);

            if format == ReportFormat::Json {
                match serde_json::to_string(&event) {
                    Ok(line) => {
                        let mut stdout = std::io::stdout().lock();
                        if let Err(e) = writeln!(stdout, "{line}") {
                            warn!(error = %e, "Failed to write event");
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to serialize event"),
                }
            }
        }

        debug!(?summary, "Reporter finished");
        summary
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ridewatch_core::{ExamType, Slot};

    #[tokio::test]
    async fn test_reporter_counts_until_closed() {
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_reporter(rx, ReportFormat::Text);

        let starts_at = NaiveDate::from_ymd_opt(2025, 6, 20)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let slot = Slot::new(ExamType::Korprov, "Farsta", starts_at);

        tx.send(ChangeEvent::added(slot.clone())).await.unwrap();
        tx.send(ChangeEvent::removed(slot)).await.unwrap();
        tx.send(ChangeEvent::heartbeat(ExamType::Korprov)).await.unwrap();
        tx.send(ChangeEvent::error(ExamType::Korprov, "boom")).await.unwrap();
        drop(tx);

        let summary = handle.await.unwrap();
        assert_eq!(
            summary,
            ReportSummary {
                added: 1,
                removed: 1,
                heartbeats: 1,
                errors: 1
            }
        );
    }
}
