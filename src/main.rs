//! `sightings-etl <SOURCE> <TABLE>`
//!
//! Loads a sighting CSV into `TABLE`. Database settings come from `sightings.toml` (or the file
//! named by `SIGHTINGS_CONFIG`) and `SIGHTINGS_*` environment variables; log verbosity from
//! `RUST_LOG` or `logging.level`.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sightings_etl::config::AppConfig;
use sightings_etl::load::SqlDestination;
use sightings_etl::observability::TracingObserver;
use sightings_etl::pipeline::Pipeline;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sightings-etl", about = "Load a sighting CSV export into a SQL table")]
struct Cli {
    /// Source CSV file
    source: PathBuf,

    /// Destination table (created when missing, appended to otherwise)
    table: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let result = config
        .context("failed to load configuration")
        .and_then(|config| run(&cli, &config));

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Errors returned here happen before the pipeline starts; run failures are reported by the
/// pipeline's observer and only set the exit code.
fn run(cli: &Cli, config: &AppConfig) -> Result<ExitCode> {
    tracing::info!(source = %cli.source.display(), table = %cli.table, "start ETL process");

    // Source first, then the database.
    File::open(&cli.source)
        .with_context(|| format!("cannot read source {}", cli.source.display()))?;

    let destination = SqlDestination::connect(&config.database)
        .context("failed to connect to destination database")?;
    let mut pipeline = Pipeline::new(destination).with_observer(Arc::new(TracingObserver));

    Ok(match pipeline.run(&cli.source, &cli.table) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    })
}
