// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # RideWatch Monitor
//!
//! The poll loop that keeps the ride store in sync with the booking service.
//!
//! - [`monitor::RideMonitor`] - fetch, diff, persist and report, on a fixed schedule
//! - [`diff::compute_diff`] - added/removed between a snapshot and the store
//! - [`schedule::next_deadline`] - drift-free tick arithmetic
//! - [`report::spawn_reporter`] - turns change events into log lines
//!
//! ## Example
//!
//! ```ignore
//! use ridewatch_monitor::{MonitorConfig, RideMonitor, ReportFormat, spawn_reporter};
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(256);
//! let reporter = spawn_reporter(rx, ReportFormat::Text);
//! let monitor = RideMonitor::new(session, source, store, tx, config);
//! monitor.run(stop_signal).await?;
//! ```

pub mod diff;
pub mod error;
pub mod monitor;
pub mod report;
pub mod schedule;

pub use diff::compute_diff;
pub use error::MonitorError;
pub use monitor::{CycleOutcome, CycleReport, MonitorConfig, PRUNE_INTERVAL, RideMonitor};
pub use report::{ReportFormat, ReportSummary, log_event, spawn_reporter};
pub use schedule::next_deadline;
