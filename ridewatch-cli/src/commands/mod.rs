//! CLI commands.

pub mod config;
pub mod monitor;
pub mod prune;
pub mod rides;
pub mod session;

use anyhow::{Context, Result};
use ridewatch_store::Config;
use std::path::PathBuf;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Config file path: `--config` or the default location.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(Config::default_path)
}

/// Loads the config file (defaults if it does not exist).
pub async fn load_config(cli: &Cli) -> Result<Config> {
    let path = config_path(cli);
    Config::load_from(&path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Prints a value as JSON, or the text rendering otherwise.
pub fn emit<T, F>(cli: &Cli, value: &T, text: F) -> Result<()>
where
    T: serde::Serialize,
    F: FnOnce(&TextFormatter) -> String,
{
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", text(&formatter));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(value)?);
        }
    }
    Ok(())
}
