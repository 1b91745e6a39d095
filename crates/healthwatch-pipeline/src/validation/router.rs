//! Zone routing
//!
//! Writes a validated batch's partitions to the clean and quarantine zones
//! under the batch's own filename. The two writes are independent: a crash
//! between them leaves one zone updated, and re-validating the landing object
//! repairs it. A later batch with the same filename overwrites the earlier
//! objects.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::PipelineResult;
use crate::storage::ObjectStore;

const CLEAN_CONTENT_TYPE: &str = "application/x-ndjson";
const QUARANTINE_CONTENT_TYPE: &str = "application/json";

pub struct ZoneRouter {
    store: Arc<dyn ObjectStore>,
    clean_prefix: String,
    quarantine_prefix: String,
}

impl ZoneRouter {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        clean_prefix: impl Into<String>,
        quarantine_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clean_prefix: clean_prefix.into(),
            quarantine_prefix: quarantine_prefix.into(),
        }
    }

    pub fn clean_key(&self, filename: &str) -> String {
        format!("{}{}", self.clean_prefix, filename)
    }

    pub fn quarantine_key(&self, filename: &str) -> String {
        format!("{}{}", self.quarantine_prefix, filename)
    }

    /// Write whichever bodies are present; a missing or empty body means no write.
    pub async fn route(
        &self,
        filename: &str,
        clean_body: Option<String>,
        quarantine_body: Option<String>,
    ) -> PipelineResult<()> {
        let mut written = 0;

        if let Some(body) = clean_body.filter(|b| !b.is_empty()) {
            let key = self.clean_key(filename);
            self.store
                .put(&key, body.into_bytes(), Some(CLEAN_CONTENT_TYPE))
                .await?;
            info!(key = %key, "Clean partition written");
            written += 1;
        }

        if let Some(body) = quarantine_body.filter(|b| !b.is_empty()) {
            let key = self.quarantine_key(filename);
            self.store
                .put(&key, body.into_bytes(), Some(QUARANTINE_CONTENT_TYPE))
                .await?;
            info!(key = %key, "Quarantine partition written");
            written += 1;
        }

        if written == 0 {
            debug!(filename, "Nothing to route");
        }

        Ok(())
    }
}
