//! Append-only delivery channel
//!
//! Each call appends exactly one newline-terminated JSON record. Delivery is
//! at-least-once: a retried write may land twice and nothing here deduplicates.

pub mod firehose;

use async_trait::async_trait;
use healthwatch_common::types::CanonicalRecord;
use tracing::info;

use crate::error::DeliveryError;

pub use firehose::FirehoseAppender;

/// Appends one record per call to the delivery channel
#[async_trait]
pub trait StreamAppender: Send + Sync {
    async fn append(&self, record: &CanonicalRecord) -> Result<(), DeliveryError>;
}

/// Logs each payload instead of delivering it.
///
/// Backs `healthwatch ingest --dry-run`; every append succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunAppender;

#[async_trait]
impl StreamAppender for DryRunAppender {
    async fn append(&self, record: &CanonicalRecord) -> Result<(), DeliveryError> {
        let line = record.to_ndjson_line()?;
        info!(location = %record.location, payload = %line.trim_end(), "Dry run: record not delivered");
        Ok(())
    }
}
