use serde::{Deserialize, Serialize};
use std::env;

use crate::config::DEFAULT_AWS_REGION;

#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    #[serde(skip_serializing, default)]
    pub access_key: Option<String>,
    #[serde(skip_serializing, default)]
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("static_credentials", &self.access_key.is_some())
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl StorageConfig {
    /// Object-store settings for `bucket`, with overrides from the environment.
    ///
    /// Without `S3_ACCESS_KEY`/`S3_SECRET_KEY` the default AWS credential chain is used.
    pub fn from_env(bucket: impl Into<String>) -> Self {
        Self {
            endpoint: env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
            region: env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_AWS_REGION.to_string()),
            bucket: bucket.into(),
            access_key: env::var("S3_ACCESS_KEY").ok(),
            secret_key: env::var("S3_SECRET_KEY").ok(),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Same settings, different bucket.
    pub fn with_bucket(&self, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..self.clone()
        }
    }
}
