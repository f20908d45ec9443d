//! The poll loop.
//!
//! One cycle: make sure the session is fresh, fetch the snapshot, diff it
//! against the present rides in the store, persist, emit events. Absent rides
//! past the retention threshold are pruned once a day. Cycle-level failures
//! are reported as events and the loop carries on; an invalid session or an
//! unavailable store ends the loop with a [`MonitorError`].

use chrono::{DateTime, Local, Utc};
use ridewatch_core::{ChangeEvent, ExamType, Session, Slot, SlotId};
use ridewatch_fetch::{ApiError, RetryPolicy, SessionManager, SlotBatch, SlotFilters, SlotSource, StopSignal};
use ridewatch_store::{RideStore, StoreError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::diff::compute_diff;
use crate::error::MonitorError;
use crate::schedule::next_deadline;

/// Minimum time between two prunes of absent rides.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

// ============================================================================
// Configuration
// ============================================================================

/// What to poll and how often.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Examination type to watch.
    pub exam_type: ExamType,
    /// Locations and date range to fetch.
    pub filters: SlotFilters,
    /// Time between cycle starts.
    pub poll_interval: Duration,
    /// Retry policy for transient fetch failures.
    pub retry: RetryPolicy,
    /// Absent rides older than this are pruned.
    pub retention: chrono::Duration,
}

// ============================================================================
// Cycle Results
// ============================================================================

/// Summary of a completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// When the cycle started.
    pub started_at: DateTime<Utc>,
    /// Slots in the snapshot.
    pub fetched: usize,
    /// Newly seen slots.
    pub added: usize,
    /// Slots that disappeared.
    pub removed: usize,
    /// Records the adapter rejected.
    pub malformed: usize,
    /// Earliest present ride from now on.
    pub next_available: Option<Slot>,
}

/// How a cycle ended.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Snapshot diffed and persisted.
    Completed(CycleReport),
    /// The fetch failed; nothing was persisted.
    Skipped {
        /// Error that ended the cycle.
        error: ApiError,
        /// Minimum wait before the next cycle.
        backoff: Option<Duration>,
    },
    /// The store rejected the cycle's data; the loop carries on.
    Aborted {
        /// Store error message.
        reason: String,
    },
}

impl CycleOutcome {
    /// Returns the report of a completed cycle.
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped { .. } | Self::Aborted { .. } => None,
        }
    }

    fn backoff(&self) -> Option<Duration> {
        match self {
            Self::Completed(_) | Self::Aborted { .. } => None,
            Self::Skipped { backoff, .. } => *backoff,
        }
    }
}

/// Result of the network half of a cycle.
enum Fetched {
    Batch(SlotBatch),
    Skipped(CycleOutcome),
}

// ============================================================================
// Monitor
// ============================================================================

/// Polls the booking service and keeps the ride store in sync.
pub struct RideMonitor {
    session: Arc<SessionManager>,
    source: Arc<dyn SlotSource>,
    store: Arc<RideStore>,
    events: mpsc::Sender<ChangeEvent>,
    config: MonitorConfig,
    last_poll: RwLock<Option<DateTime<Utc>>>,
    last_prune: RwLock<Option<Instant>>,
}

impl std::fmt::Debug for RideMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideMonitor")
            .field("source", &self.source.id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RideMonitor {
    /// Creates a monitor. Events are sent to `events`.
    pub fn new(
        session: Arc<SessionManager>,
        source: Arc<dyn SlotSource>,
        store: Arc<RideStore>,
        events: mpsc::Sender<ChangeEvent>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            session,
            source,
            store,
            events,
            config,
            last_poll: RwLock::new(None),
            last_prune: RwLock::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start of the last completed cycle.
    pub async fn last_poll(&self) -> Option<DateTime<Utc>> {
        *self.last_poll.read().await
    }

    /// Runs cycles until `stop` fires or a fatal error occurs.
    ///
    /// A stop during the fetch abandons that cycle. Persisting a fetched
    /// snapshot is never interrupted.
    pub async fn run(&self, mut stop: StopSignal) -> Result<(), MonitorError> {
        info!(
            source = self.source.id(),
            exam = %self.config.exam_type,
            interval_secs = self.config.poll_interval.as_secs(),
            locations = ?self.config.filters.location_ids,
            "Monitor started"
        );

        loop {
            if stop.is_stopped() {
                break;
            }

            let cycle_start = Instant::now();
            let started_at = Utc::now();

            let fetched = tokio::select! {
                () = stop.stopped() => {
                    debug!("Stop requested during fetch");
                    break;
                }
                fetched = self.fetch_phase() => fetched,
            };

            let outcome = match fetched {
                Ok(Fetched::Batch(batch)) => self.apply(batch, started_at).await,
                Ok(Fetched::Skipped(outcome)) => Ok(outcome),
                Err(e) => Err(e),
            };
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.log_fatal(&e).await;
                    return Err(e);
                }
            };

            let deadline = next_deadline(
                cycle_start,
                self.config.poll_interval,
                Instant::now(),
                outcome.backoff(),
            );

            tokio::select! {
                () = stop.stopped() => break,
                () = tokio::time::sleep_until(deadline) => {}
            }
        }

        let last_poll = self.last_poll().await;
        info!(last_poll = ?last_poll, "Monitor stopped");
        Ok(())
    }

    /// Runs a single cycle.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, MonitorError> {
        let started_at = Utc::now();
        let result = match self.fetch_phase().await {
            Ok(Fetched::Batch(batch)) => self.apply(batch, started_at).await,
            Ok(Fetched::Skipped(outcome)) => Ok(outcome),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.log_fatal(e).await;
        }
        result
    }

    // ------------------------------------------------------------------------
    // Fetch
    // ------------------------------------------------------------------------

    #[instrument(skip(self), fields(exam = %self.config.exam_type))]
    async fn fetch_phase(&self) -> Result<Fetched, MonitorError> {
        let last_poll = self.last_poll().await;
        let expired = |source| MonitorError::SessionExpired { source, last_poll };

        let session = self.session.ensure_fresh().await.map_err(expired)?;

        let error = match self.fetch_with_retry(&session).await {
            Ok(batch) => return Ok(Fetched::Batch(batch)),
            Err(e) if e.is_auth() => {
                let renewed = self
                    .session
                    .handle_unexpected_expiry(&session)
                    .await
                    .map_err(expired)?;

                match self.fetch_with_retry(&renewed).await {
                    Ok(batch) => return Ok(Fetched::Batch(batch)),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        let backoff = match &error {
            ApiError::RateLimited { retry_after } => {
                Some(Duration::from_secs(retry_after.unwrap_or(0)))
            }
            _ => None,
        };

        warn!(
            error = %error,
            kind = error.kind(),
            backoff_secs = backoff.map(|d| d.as_secs()),
            "Skipping cycle"
        );
        self.emit(ChangeEvent::error(
            self.config.exam_type,
            format!("{}: {error}", error.kind()),
        ))
        .await;

        Ok(Fetched::Skipped(CycleOutcome::Skipped { error, backoff }))
    }

    async fn fetch_with_retry(&self, session: &Session) -> Result<SlotBatch, ApiError> {
        let exam_type = self.config.exam_type;
        let filters = &self.config.filters;
        let source = &self.source;

        self.config
            .retry
            .execute(
                "fetch_slots",
                move |_| source.fetch_slots(session, exam_type, filters),
                ApiError::is_transient,
            )
            .await
            .map_err(|exhausted| exhausted.error)
    }

    // ------------------------------------------------------------------------
    // Diff and persist
    // ------------------------------------------------------------------------

    /// Persists a batch. Only an unusable store is fatal; bad stored data
    /// aborts this cycle.
    async fn apply(&self, batch: SlotBatch, started_at: DateTime<Utc>) -> Result<CycleOutcome, MonitorError> {
        match self.persist(batch, started_at).await {
            Ok(report) => Ok(CycleOutcome::Completed(report)),
            Err(source) if source.is_unavailable() => Err(MonitorError::StoreUnavailable {
                source,
                last_poll: self.last_poll().await,
            }),
            Err(e) => {
                warn!(error = %e, "Store rejected cycle data, skipping cycle");
                self.emit(ChangeEvent::error(self.config.exam_type, format!("store: {e}")))
                    .await;
                Ok(CycleOutcome::Aborted {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn persist(&self, batch: SlotBatch, started_at: DateTime<Utc>) -> Result<CycleReport, StoreError> {
        let exam_type = self.config.exam_type;

        // Rides the fetch could not have returned are left alone.
        let known: Vec<Slot> = self
            .store
            .present(exam_type)?
            .into_iter()
            .filter(|slot| self.is_observed(slot))
            .collect();

        let diff = compute_diff(&batch.slots, &known);
        self.store.record_poll(&batch.slots, &diff.removed)?;

        let absent_since = Utc::now();
        let mut known_by_id: HashMap<SlotId, Slot> =
            known.into_iter().map(|slot| (slot.id.clone(), slot)).collect();

        for rejected in &batch.rejected {
            let detail = match rejected.location_id {
                Some(id) => format!("malformed record at location {id}: {}", rejected.reason),
                None => format!("malformed record: {}", rejected.reason),
            };
            self.emit(ChangeEvent::error(exam_type, detail)).await;
        }
        for slot in &diff.added {
            self.emit(ChangeEvent::added(slot.clone())).await;
        }
        for id in &diff.removed {
            if let Some(mut slot) = known_by_id.remove(id) {
                slot.absent_since = Some(absent_since);
                self.emit(ChangeEvent::removed(slot)).await;
            }
        }
        if diff.is_empty() {
            self.emit(ChangeEvent::heartbeat(exam_type)).await;
        }

        self.prune_if_due().await?;

        let next_available = self
            .store
            .next_available(exam_type, Local::now().naive_local())?;

        *self.last_poll.write().await = Some(started_at);

        let report = CycleReport {
            started_at,
            fetched: batch.slots.len(),
            added: diff.added.len(),
            removed: diff.removed.len(),
            malformed: batch.rejected.len(),
            next_available,
        };
        info!(
            exam = %exam_type,
            fetched = report.fetched,
            added = report.added,
            removed = report.removed,
            malformed = report.malformed,
            next = report.next_available.as_ref().map(Slot::summary),
            "Cycle complete"
        );

        Ok(report)
    }

    /// Prunes absent rides past the retention threshold, at most once per
    /// [`PRUNE_INTERVAL`].
    async fn prune_if_due(&self) -> Result<(), StoreError> {
        let mut last_prune = self.last_prune.write().await;
        if last_prune.is_some_and(|at| at.elapsed() < PRUNE_INTERVAL) {
            return Ok(());
        }

        let deleted = self.store.prune(self.config.retention)?;
        *last_prune = Some(Instant::now());
        debug!(deleted, retention_days = self.config.retention.num_days(), "Retention prune done");
        Ok(())
    }

    /// Returns true if a stored ride falls inside what this monitor fetches.
    fn is_observed(&self, slot: &Slot) -> bool {
        let ids = &self.config.filters.location_ids;
        let location_polled = match slot.location_id {
            Some(id) => ids.contains(&id),
            None => true,
        };
        location_polled && self.config.filters.matches(slot)
    }

    async fn emit(&self, event: ChangeEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Event receiver dropped");
        }
    }

    async fn log_fatal(&self, e: &MonitorError) {
        let last_poll = self.last_poll().await;
        let last_refresh = match e.last_refresh() {
            Some(at) => Some(at),
            None => self.session.last_refresh().await,
        };
        error!(
            error = %e,
            kind = e.kind(),
            last_poll = ?last_poll,
            last_refresh = ?last_refresh,
            "Monitor halted"
        );
    }
}
