//! Session command - inspect, renew or import the login session.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use ridewatch_fetch::cookies::{self, CookieMap};
use ridewatch_fetch::SessionManager;
use ridewatch_providers::TrafikverketClient;
use ridewatch_store::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::{config_path, emit, load_config};
use crate::Cli;

/// Arguments for the session command.
#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

/// Session subcommands.
#[derive(Subcommand)]
pub enum SessionAction {
    /// Show session validity without contacting the service.
    Info,

    /// Renew the session now and store the new cookies.
    Refresh,

    /// Import cookies from captured HTTP text.
    Import {
        /// File holding a captured request (`Cookie:` header).
        #[arg(long, conflicts_with = "response", required_unless_present = "response")]
        request: Option<PathBuf>,

        /// File holding a captured response (`Set-Cookie:` headers).
        #[arg(long)]
        response: Option<PathBuf>,
    },
}

/// Runs the session command.
pub async fn run(args: &SessionArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        SessionAction::Info => show_info(cli).await,
        SessionAction::Refresh => refresh(cli).await,
        SessionAction::Import { request, response } => {
            import(request.as_ref(), response.as_ref(), cli).await
        }
    }
}

fn manager(config: &Config) -> Result<SessionManager> {
    let client = Arc::new(TrafikverketClient::new(&config.user_agent)?);
    SessionManager::initialize(&config.ssn, config.cookies.clone(), client, config.session_config())
        .context("Session cannot be started from the configured cookies")
}

async fn show_info(cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let info = manager(&config)?.info().await;
    emit(cli, &info, |f| f.format_session(&info))
}

async fn refresh(cli: &Cli) -> Result<()> {
    let path = config_path(cli);
    let mut config = load_config(cli).await?;
    let manager = manager(&config)?;

    let session = manager.force_refresh().await?;
    config.merge_cookies(&session.cookies);
    config.save_to(&path).await?;
    info!(generation = session.generation, "Session renewed and saved");

    let info = manager.info().await;
    emit(cli, &info, |f| f.format_session(&info))
}

async fn import(request: Option<&PathBuf>, response: Option<&PathBuf>, cli: &Cli) -> Result<()> {
    let (file, parsed) = match (request, response) {
        (Some(file), _) => (file, cookies::cookies_from_request_text(&read(file).await?)),
        (None, Some(file)) => (file, cookies::cookies_from_response_text(&read(file).await?)),
        (None, None) => bail!("Pass --request or --response"),
    };

    if parsed.is_empty() {
        bail!("No cookies found in {}", file.display());
    }

    let path = config_path(cli);
    let mut config = load_config(cli).await?;
    config.merge_cookies(&parsed);
    config.save_to(&path).await?;

    let missing = cookies::missing_required(&config.cookies);
    let expires_at = cookies::login_expiry(&config.cookies);
    info!(imported = parsed.len(), missing = missing.len(), "Imported cookies");

    let value = serde_json::json!({
        "imported": names(&parsed),
        "missing": missing,
        "expires_at": expires_at,
    });
    emit(cli, &value, |_| {
        let mut lines = vec![format!(
            "Imported {} cookie(s) into {}: {}",
            parsed.len(),
            path.display(),
            names(&parsed).join(", ")
        )];
        if !missing.is_empty() {
            lines.push(format!("Still missing: {}", missing.join(", ")));
        }
        if let Some(at) = expires_at {
            lines.push(format!(
                "Login valid until {}",
                at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            ));
        }
        lines.join("\n")
    })
}

async fn read(file: &Path) -> Result<String> {
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

fn names(jar: &CookieMap) -> Vec<&str> {
    jar.keys().map(String::as_str).collect()
}
