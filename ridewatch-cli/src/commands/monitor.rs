//! Monitor command - poll for free slots until interrupted.

use anyhow::{Context, Result};
use clap::Args;
use ridewatch_core::{ExamType, Session};
use ridewatch_fetch::{SessionManager, StopHandle, StopSignal, stop_channel};
use ridewatch_monitor::{CycleOutcome, MonitorConfig, ReportFormat, RideMonitor, spawn_reporter};
use ridewatch_providers::TrafikverketClient;
use ridewatch_store::{Config, RideStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{config_path, emit};
use crate::{Cli, OutputFormat};

/// Events buffered between the monitor and the reporter.
const EVENT_BUFFER: usize = 256;

/// Arguments for the monitor command.
#[derive(Args)]
pub struct MonitorArgs {
    /// Examination type (kunskapsprov or korprov); overrides the config.
    #[arg(long, short)]
    pub exam: Option<ExamType>,

    /// Poll interval in seconds; overrides the config.
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Run a single cycle and exit.
    #[arg(long)]
    pub once: bool,
}

/// Runs the monitor command.
pub async fn run(args: &MonitorArgs, cli: &Cli) -> Result<()> {
    let path = config_path(cli);
    let mut config = Config::load_from(&path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(exam) = args.exam {
        config.exam_type = exam;
    }
    if let Some(secs) = args.interval {
        config.poll_interval_secs = secs;
    }
    config.validate().context("Invalid configuration")?;

    let client = Arc::new(TrafikverketClient::new(&config.user_agent)?);
    let session = Arc::new(
        SessionManager::initialize(
            &config.ssn,
            config.cookies.clone(),
            client.clone(),
            config.session_config(),
        )
        .context("Cannot start a session; import fresh cookies with `ridewatch session import`")?,
    );

    let db_path = config.database_path();
    let store = Arc::new(
        RideStore::open(&db_path)
            .with_context(|| format!("Failed to open ride database {}", db_path.display()))?,
    );

    let report_format = match cli.format {
        OutputFormat::Json if !args.once => ReportFormat::Json,
        _ => ReportFormat::Text,
    };
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let reporter = spawn_reporter(events_rx, report_format);

    let monitor = RideMonitor::new(
        session.clone(),
        client,
        store,
        events_tx,
        MonitorConfig {
            exam_type: config.exam_type,
            filters: config.filters(),
            poll_interval: config.poll_interval(),
            retry: config.retry.clone(),
            retention: config.retention(),
        },
    );

    let (stop, signal) = stop_channel();
    let persister = spawn_cookie_persister(session.subscribe(), path, signal.clone());

    let result = if args.once {
        run_once(&monitor, cli).await
    } else {
        run_until_stopped(&monitor, &session, &config, &stop, signal).await
    };

    stop.stop();
    drop(monitor);
    if let Err(e) = persister.await {
        warn!(error = %e, "Cookie persister task failed");
    }
    match reporter.await {
        Ok(summary) => debug!(?summary, "Reporter summary"),
        Err(e) => warn!(error = %e, "Reporter task failed"),
    }

    result
}

async fn run_once(monitor: &RideMonitor, cli: &Cli) -> Result<()> {
    let outcome = monitor.run_cycle().await?;
    match &outcome {
        CycleOutcome::Completed(report) => {
            emit(cli, report, |f| f.format_cycle_report(report))?;
        }
        CycleOutcome::Skipped { error, .. } => {
            let value = serde_json::json!({
                "skipped": true,
                "kind": error.kind(),
                "error": error.to_string(),
            });
            emit(cli, &value, |f| f.format_skipped(error.kind(), &error.to_string()))?;
        }
        CycleOutcome::Aborted { reason } => {
            let value = serde_json::json!({
                "skipped": true,
                "kind": "store",
                "error": reason,
            });
            emit(cli, &value, |f| f.format_skipped("store", reason))?;
        }
    }
    Ok(())
}

async fn run_until_stopped(
    monitor: &RideMonitor,
    session: &Arc<SessionManager>,
    config: &Config,
    stop: &StopHandle,
    signal: StopSignal,
) -> Result<()> {
    let refresher =
        session.start_background_refresh(config.session_config().refresh_interval, signal.clone());

    // On Ctrl-C the monitor is signalled and allowed to finish its current step.
    let run = monitor.run(signal);
    tokio::pin!(run);
    let result = tokio::select! {
        result = &mut run => result,
        () = wait_for_interrupt() => {
            info!("Interrupt received, stopping");
            stop.stop();
            run.await
        }
    };

    stop.stop();
    if let Err(e) = refresher.await {
        warn!(error = %e, "Background refresh task failed");
    }

    result.context("Monitor stopped")
}

async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Cookie Persistence
// ============================================================================

/// Writes renewed cookies back to the config file.
fn spawn_cookie_persister(
    mut sessions: watch::Receiver<Session>,
    path: PathBuf,
    mut stop: StopSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = stop.stopped() => {
                    if sessions.has_changed().unwrap_or(false) {
                        let session = sessions.borrow_and_update().clone();
                        persist_cookies(&path, &session).await;
                    }
                    break;
                }
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let session = sessions.borrow_and_update().clone();
                    persist_cookies(&path, &session).await;
                }
            }
        }
    })
}

async fn persist_cookies(path: &Path, session: &Session) {
    let mut config = match Config::load_from(path).await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Cannot reload config to store renewed cookies");
            return;
        }
    };

    config.merge_cookies(&session.cookies);
    match config.save_to(path).await {
        Ok(()) => debug!(generation = session.generation, "Stored renewed cookies"),
        Err(e) => warn!(error = %e, "Failed to store renewed cookies"),
    }
}
