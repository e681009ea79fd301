//! petrel: A standalone tool for batch-loading Odoo business records into
//! BigQuery.
//!
//! This tool pulls records from an Odoo HTTP endpoint, flattens them into
//! warehouse-shaped rows, stages them as NDJSON in Cloud Storage, and
//! triggers truncate-and-replace load jobs against BigQuery.

mod config;
mod error;
mod metrics;
mod pipeline;
mod record;
mod source;
mod staging;
mod storage;
mod warehouse;

use clap::Parser;
use snafu::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{AddressParseSnafu, ConfigSnafu, MetricsSnafu, PipelineError};
use pipeline::run_pipeline;
use record::CATALOG;

/// Odoo to BigQuery batch load tool.
#[derive(Parser, Debug)]
#[command(name = "petrel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Dry run - validate configuration without processing.
    #[arg(long)]
    dry_run: bool,
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("petrel starting");

    // Load or build configuration
    let config = build_config(&args)?;

    // Initialize metrics if enabled
    if config.metrics.enabled {
        let addr = config.metrics.address.parse().context(AddressParseSnafu)?;
        metrics::init(addr).context(MetricsSnafu)?;
        debug!(
            "Metrics endpoint listening on http://{}/metrics",
            config.metrics.address
        );
    }

    if args.dry_run {
        info!("Dry run mode - validating configuration");
        info!("Source: {}", config.odoo.base_url);
        info!("Source database: {}", config.odoo.db_name);
        info!("Staging bucket: {}", config.bigquery.bucket_name);
        info!(
            "Dataset: {}.{}",
            config.bigquery.project_id, config.bigquery.dataset_id
        );
        info!("Entities: {}", CATALOG.len());
        for entity in CATALOG {
            info!(
                "  - {} from {} (chunk size {})",
                entity.table, entity.model, entity.chunk_size
            );
        }
        info!("Configuration is valid");
        return Ok(());
    }

    // Run the pipeline
    let stats = run_pipeline(config).await?;

    info!("Pipeline completed successfully");
    info!("  Entities loaded: {}", stats.entities_loaded);
    info!("  Entities skipped: {}", stats.entities_skipped);
    info!("  Records fetched: {}", stats.records_fetched);
    info!("  Rows loaded: {}", stats.rows_loaded);
    info!("  Bytes staged: {}", stats.bytes_staged);

    Ok(())
}

/// Build configuration from arguments.
fn build_config(args: &Args) -> Result<Config, PipelineError> {
    Config::from_file(&args.config).context(ConfigSnafu)
}
