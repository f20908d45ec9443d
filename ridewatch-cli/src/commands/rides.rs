//! Rides command - list recorded rides.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use ridewatch_core::ExamType;
use ridewatch_store::{RideQuery, RideStore};

use super::{emit, load_config};
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the rides command.
#[derive(Args)]
pub struct RidesArgs {
    /// Examination type; defaults to the configured one.
    #[arg(long, short)]
    pub exam: Option<ExamType>,

    /// Earliest date (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest date (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Location name.
    #[arg(long, short)]
    pub location: Option<String>,

    /// Include rides that are no longer offered.
    #[arg(long, short)]
    pub all: bool,

    /// Show only the next available ride from now.
    #[arg(long, short)]
    pub next: bool,
}

impl RidesArgs {
    fn query(&self, exam_type: ExamType) -> RideQuery {
        RideQuery {
            exam_type: Some(exam_type),
            from: self.from,
            to: self.to,
            location: self.location.clone(),
            include_absent: self.all,
        }
    }
}

/// Runs the rides command.
pub async fn run(args: &RidesArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let exam_type = args.exam.unwrap_or(config.exam_type);

    let db_path = config.database_path();
    let store = RideStore::open(&db_path)
        .with_context(|| format!("Failed to open ride database {}", db_path.display()))?;

    if args.next {
        let next = store.next_available(exam_type, Local::now().naive_local())?;
        return match cli.format {
            OutputFormat::Text => emit(cli, &(), |f| f.format_next_ride(next.as_ref())),
            OutputFormat::Json => {
                println!("{}", JsonFormatter::new(cli.pretty).format_ride(next.as_ref())?);
                Ok(())
            }
        };
    }

    let rides = store.query(&args.query(exam_type))?;
    match cli.format {
        OutputFormat::Text => {
            let stats = store.stats(Some(exam_type))?;
            emit(cli, &(), |f| {
                format!("{}\n{}", f.format_rides(&rides), f.format_stats(&stats))
            })
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format_rides(&rides)?);
            Ok(())
        }
    }
}
