//! Config command - manage configuration.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use ridewatch_core::ExamType;
use ridewatch_store::{Config, default_config_dir};
use serde::Serialize;
use tracing::info;

use super::{config_path, emit, load_config};
use crate::Cli;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration (secrets hidden).
    Show,

    /// Show configuration paths.
    Path,

    /// Create a configuration file.
    Init {
        /// Personal identity number used for bookings.
        #[arg(long)]
        ssn: String,

        /// Location id to poll (repeatable).
        #[arg(long = "location-id")]
        location_ids: Vec<u32>,

        /// Examination type.
        #[arg(long, short)]
        exam: Option<ExamType>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli).await,
        ConfigAction::Init {
            ssn,
            location_ids,
            exam,
            force,
        } => init_config(ssn, location_ids, *exam, *force, cli).await,
    }
}

/// Configuration with credentials reduced to presence flags.
#[derive(Serialize)]
struct ConfigView<'a> {
    ssn_set: bool,
    cookies: Vec<&'a str>,
    exam_type: ExamType,
    location_ids: &'a [u32],
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_from: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_to: Option<chrono::NaiveDate>,
    poll_interval_secs: u64,
    refresh_interval_secs: u64,
    safety_margin_secs: u64,
    retention_days: u32,
    retry_max_attempts: u32,
    database_path: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
}

impl<'a> ConfigView<'a> {
    fn new(config: &'a Config) -> Self {
        let problem = config.validate().err().map(|e| e.to_string());
        Self {
            ssn_set: !config.ssn.is_empty(),
            cookies: config.cookies.keys().map(String::as_str).collect(),
            exam_type: config.exam_type,
            location_ids: &config.location_ids,
            location: config.location.as_deref(),
            date_from: config.date_from,
            date_to: config.date_to,
            poll_interval_secs: config.poll_interval_secs,
            refresh_interval_secs: config.refresh_interval_secs,
            safety_margin_secs: config.safety_margin_secs,
            retention_days: config.retention_days,
            retry_max_attempts: config.retry.max_attempts,
            database_path: config.database_path().display().to_string(),
            valid: problem.is_none(),
            problem,
        }
    }

    fn render(&self) -> String {
        let mut lines = vec![
            "RideWatch Configuration".to_string(),
            "─".repeat(40),
            String::new(),
            format!("SSN:              {}", if self.ssn_set { "set" } else { "not set" }),
            format!("Cookies:          {}", self.cookies.join(", ")),
            format!("Exam type:        {}", self.exam_type.display_name()),
            format!("Location ids:     {:?}", self.location_ids),
        ];
        if let Some(location) = self.location {
            lines.push(format!("Location filter:  {location}"));
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            lines.push(format!(
                "Dates:            {} .. {}",
                self.date_from.map_or_else(|| "*".to_string(), |d| d.to_string()),
                self.date_to.map_or_else(|| "*".to_string(), |d| d.to_string())
            ));
        }
        lines.extend([
            format!("Poll interval:    {}s", self.poll_interval_secs),
            format!("Session refresh:  {}s", self.refresh_interval_secs),
            format!("Safety margin:    {}s", self.safety_margin_secs),
            format!("Retention:        {} days", self.retention_days),
            format!("Retry attempts:   {}", self.retry_max_attempts),
            format!("Database:         {}", self.database_path),
        ]);
        if let Some(problem) = &self.problem {
            lines.push(String::new());
            lines.push(format!("Problem: {problem}"));
        }
        lines.join("\n")
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let view = ConfigView::new(&config);
    emit(cli, &view, |_| view.render())
}

async fn show_paths(cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let config_dir = default_config_dir();
    let config_file = config_path(cli);
    let database = config.database_path();

    let paths = serde_json::json!({
        "config_dir": config_dir.display().to_string(),
        "config_file": config_file.display().to_string(),
        "database": database.display().to_string(),
    });
    emit(cli, &paths, |_| {
        [
            "Configuration Paths".to_string(),
            "─".repeat(40),
            String::new(),
            format!("Config dir:  {}", config_dir.display()),
            format!("Config file: {}", config_file.display()),
            format!("Database:    {}", database.display()),
        ]
        .join("\n")
    })
}

async fn init_config(
    ssn: &str,
    location_ids: &[u32],
    exam: Option<ExamType>,
    force: bool,
    cli: &Cli,
) -> Result<()> {
    let path = config_path(cli);
    if !force && tokio::fs::try_exists(&path).await? {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }

    let mut config = Config {
        ssn: ssn.trim().to_string(),
        location_ids: location_ids.to_vec(),
        ..Config::default()
    };
    if let Some(exam) = exam {
        config.exam_type = exam;
    }
    config.save_to(&path).await?;
    info!(path = %path.display(), "Configuration created");

    let view = ConfigView::new(&config);
    emit(cli, &view, |_| {
        format!(
            "Created {}\nNext: import cookies with `ridewatch session import --request FILE`",
            path.display()
        )
    })
}
