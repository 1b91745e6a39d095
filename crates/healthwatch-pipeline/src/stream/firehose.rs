//! Firehose delivery stream appender

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_firehose::{error::DisplayErrorContext, primitives::Blob, types::Record, Client};
use healthwatch_common::types::CanonicalRecord;
use tracing::{debug, info, instrument};

use super::StreamAppender;
use crate::config::DeliveryConfig;
use crate::error::DeliveryError;

/// Appends records to a Firehose delivery stream with one `PutRecord` per record
#[derive(Clone)]
pub struct FirehoseAppender {
    client: Client,
    stream_name: String,
}

impl FirehoseAppender {
    /// Build a client from the default AWS credential chain.
    pub async fn new(config: &DeliveryConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        info!(
            stream = %config.stream_name,
            region = %config.region,
            "Firehose appender initialized"
        );

        Self::from_client(Client::new(&sdk_config), config.stream_name.clone())
    }

    pub fn from_client(client: Client, stream_name: impl Into<String>) -> Self {
        Self {
            client,
            stream_name: stream_name.into(),
        }
    }
}

#[async_trait]
impl StreamAppender for FirehoseAppender {
    #[instrument(skip_all, fields(stream = %self.stream_name, location = %record.location))]
    async fn append(&self, record: &CanonicalRecord) -> Result<(), DeliveryError> {
        let line = record.to_ndjson_line()?;

        let firehose_record = Record::builder()
            .data(Blob::new(line.into_bytes()))
            .build()
            .map_err(|e| DeliveryError::Rejected(e.to_string()))?;

        let output = self
            .client
            .put_record()
            .delivery_stream_name(&self.stream_name)
            .record(firehose_record)
            .send()
            .await
            .map_err(|e| DeliveryError::Rejected(DisplayErrorContext(&e).to_string()))?;

        debug!(record_id = ?output.record_id(), "Record accepted by delivery stream");

        Ok(())
    }
}
