//! Healthwatch - ingestion and batch validation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use healthwatch_common::logging::{init_logging, LogConfig, LogLevel};
use healthwatch_pipeline::{
    catalog::LocationCatalog,
    config::PipelineConfig,
    fetcher::IngestionFetcher,
    sources::SourceSet,
    storage::{config::StorageConfig, S3Store},
    stream::{DryRunAppender, FirehoseAppender, StreamAppender},
    validation::{BatchValidator, ObjectCreated},
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "healthwatch")]
#[command(author, version, about = "Environmental and health-risk signal pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every monitored location once and append the records to the delivery stream
    Ingest {
        /// Log records instead of delivering them
        #[arg(long)]
        dry_run: bool,

        /// Location catalog file (.json or .toml)
        #[arg(short, long)]
        locations: Option<PathBuf>,
    },

    /// Validate one landed batch object
    Validate {
        /// Bucket holding the batch (defaults to the destination bucket)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Object key of the batch, e.g. raw/2026/02/02/batch-1
        #[arg(short, long)]
        key: String,
    },

    /// Validate every object named in an S3 object-created notification
    ValidateEvent {
        /// Notification JSON file, or '-' for stdin
        #[arg(short, long)]
        event: PathBuf,
    },

    /// Print the effective location catalog
    Locations {
        /// Location catalog file (.json or .toml)
        #[arg(short, long)]
        locations: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .filter_directives("aws_config=warn,aws_smithy_runtime=warn,hyper=info")
        .build()
        .with_env_overrides()?;

    let _log_guard = init_logging(&log_config)?;

    let config = PipelineConfig::load()?;

    match cli.command {
        Command::Ingest { dry_run, locations } => {
            let catalog = load_catalog(locations.as_deref(), &config)?;
            let sources = SourceSet::from_config(&config.sources)?;

            let appender: Arc<dyn StreamAppender> = if dry_run {
                info!("Dry run: records will be logged, not delivered");
                Arc::new(DryRunAppender)
            } else {
                Arc::new(FirehoseAppender::new(&config.delivery).await)
            };

            let summary = IngestionFetcher::new(catalog, sources, appender)
                .with_max_concurrency(config.sources.max_concurrency)
                .run()
                .await?;

            print_json(&summary)?;
        },
        Command::Validate { bucket, key } => {
            let storage = StorageConfig::from_env(&config.zones.dest_bucket);
            let validator = destination_validator(&config, &storage).await;
            let bucket = bucket.unwrap_or_else(|| config.zones.dest_bucket.clone());
            let source = S3Store::new(storage.with_bucket(bucket)).await;

            let report = validator.process_object(&source, &key).await?;
            print_json(&report)?;
        },
        Command::ValidateEvent { event } => {
            let document = read_event(&event).await?;
            let created = ObjectCreated::from_json(&document)?;
            let storage = StorageConfig::from_env(&config.zones.dest_bucket);
            let validator = destination_validator(&config, &storage).await;

            let mut sources: HashMap<String, S3Store> = HashMap::new();
            let mut reports = Vec::with_capacity(created.len());

            for object in created {
                if !sources.contains_key(&object.bucket) {
                    let store = S3Store::new(storage.with_bucket(&object.bucket)).await;
                    sources.insert(object.bucket.clone(), store);
                }
                let source = sources
                    .get(&object.bucket)
                    .context("source store missing after insert")?;

                reports.push(validator.process_object(source, &object.key).await?);
            }

            print_json(&reports)?;
        },
        Command::Locations { locations } => {
            let catalog = load_catalog(locations.as_deref(), &config)?;
            print_json(&catalog.locations())?;
        },
    }

    Ok(())
}

fn load_catalog(cli_path: Option<&Path>, config: &PipelineConfig) -> Result<LocationCatalog> {
    let path = cli_path.or(config.locations_file.as_deref());
    LocationCatalog::load(path).context("Failed to load location catalog")
}

async fn destination_validator(config: &PipelineConfig, storage: &StorageConfig) -> BatchValidator {
    let destination = S3Store::new(storage.clone()).await;
    BatchValidator::new(&config.zones, Arc::new(destination))
}

async fn read_event(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut document = String::new();
        tokio::io::stdin()
            .read_to_string(&mut document)
            .await
            .context("Failed to read notification from stdin")?;
        Ok(document)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read notification {}", path.display()))
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
