//! Ingestion run
//!
//! One run walks the catalog, fetches the three sources for each location,
//! normalizes the payloads and appends the record to the delivery channel.
//!
//! Failure isolation is per location: if any of a location's three source
//! calls fails, that location is skipped for this run and the rest proceed.
//! No retries happen inside a run; the next scheduled run covers the gap.
//! A delivery failure is different and aborts the run so the scheduler can
//! retry it as a whole.

use chrono::{SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use healthwatch_common::types::Location;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::catalog::LocationCatalog;
use crate::error::{PipelineResult, SourceFetchError};
use crate::normalize;
use crate::sources::SourceSet;
use crate::stream::StreamAppender;

/// Summary of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    pub status: &'static str,
    pub records_sent: usize,
    /// Locations skipped because a source failed, in completion order
    pub skipped: Vec<String>,
}

/// What happened to one location
#[derive(Debug)]
enum LocationOutcome {
    Appended,
    Skipped(SourceFetchError),
}

pub struct IngestionFetcher {
    catalog: LocationCatalog,
    sources: SourceSet,
    appender: Arc<dyn StreamAppender>,
    max_concurrency: usize,
}

impl IngestionFetcher {
    pub fn new(catalog: LocationCatalog, sources: SourceSet, appender: Arc<dyn StreamAppender>) -> Self {
        Self {
            catalog,
            sources,
            appender,
            max_concurrency: 1,
        }
    }

    /// Process up to `max_concurrency` locations at once (minimum 1).
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Run one ingestion pass over the whole catalog.
    ///
    /// Returns an error only when the delivery channel rejects a record.
    #[instrument(skip(self), fields(locations = self.catalog.len(), concurrency = self.max_concurrency))]
    pub async fn run(&self) -> PipelineResult<IngestionSummary> {
        info!("Starting ingestion run");

        let mut outcomes = stream::iter(self.catalog.locations())
            .map(|location| async move { (location, self.process_location(location).await) })
            .buffer_unordered(self.max_concurrency);

        let mut records_sent = 0;
        let mut skipped = Vec::new();

        while let Some((location, outcome)) = outcomes.next().await {
            match outcome {
                Ok(LocationOutcome::Appended) => {
                    records_sent += 1;
                    info!(location = %location.name, "Record appended");
                },
                Ok(LocationOutcome::Skipped(err)) => {
                    warn!(
                        location = %location.name,
                        source = %err.source_kind(),
                        timeout = err.is_timeout(),
                        error = %err,
                        "Skipping location for this run"
                    );
                    skipped.push(location.name.clone());
                },
                Err(err) => {
                    error!(location = %location.name, error = %err, "Delivery failed, aborting run");
                    return Err(err);
                },
            }
        }

        info!(records_sent, skipped = skipped.len(), "Ingestion run complete");

        Ok(IngestionSummary {
            status: "complete",
            records_sent,
            skipped,
        })
    }

    async fn process_location(&self, location: &Location) -> PipelineResult<LocationOutcome> {
        let fetched = futures::try_join!(
            self.sources.current_conditions.fetch(location),
            self.sources.air_quality.fetch(location),
            self.sources.lifestyle_index.fetch(location),
        );

        let (current_conditions, air_quality, lifestyle) = match fetched {
            Ok(payloads) => payloads,
            Err(err) => return Ok(LocationOutcome::Skipped(err)),
        };

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let record = normalize::normalize(location, timestamp, &current_conditions, &air_quality, &lifestyle);

        self.appender.append(&record).await?;

        Ok(LocationOutcome::Appended)
    }
}
