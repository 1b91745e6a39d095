//! Healthwatch Pipeline Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Collects weather, air-quality and health-index signals for a fixed set of
//! monitored locations, delivers them as newline-delimited JSON through an
//! append-only stream, and validates the landed batches into a clean zone and
//! a quarantine zone.
//!
//! # Stages
//!
//! - **Ingestion**: [`fetcher::IngestionFetcher`] walks the [`catalog::LocationCatalog`],
//!   calls the three [`sources::SourceClient`]s per location, builds a record with
//!   [`normalize::normalize`] and hands it to a [`stream::StreamAppender`].
//! - **Validation**: [`validation::BatchValidator`] classifies every line of a landed
//!   batch and [`validation::ZoneRouter`] writes the partitions through an
//!   [`storage::ObjectStore`].
//!
//! # Example
//!
//! ```no_run
//! use healthwatch_pipeline::{catalog::LocationCatalog, config::PipelineConfig};
//! use healthwatch_pipeline::fetcher::IngestionFetcher;
//! use healthwatch_pipeline::sources::SourceSet;
//! use healthwatch_pipeline::stream::DryRunAppender;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::load()?;
//!     let fetcher = IngestionFetcher::new(
//!         LocationCatalog::builtin(),
//!         SourceSet::from_config(&config.sources)?,
//!         Arc::new(DryRunAppender),
//!     );
//!     let summary = fetcher.run().await?;
//!     println!("{} records sent", summary.records_sent);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod sources;
pub mod storage;
pub mod stream;
pub mod validation;

pub use error::{DeliveryError, PipelineError, PipelineResult, SourceFetchError, StorageError};
