//! External data sources
//!
//! Each source is a stateless request/response wrapper returning the raw,
//! untyped payload for one location. Interpretation of the payload belongs to
//! [`crate::normalize`].

pub mod endpoints;

use async_trait::async_trait;
use healthwatch_common::types::Location;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::SourceConfig;
use crate::error::{PipelineError, PipelineResult, SourceFetchError};

/// The three roles a source plays for a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    CurrentConditions,
    AirQuality,
    LifestyleIndex,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::CurrentConditions => "current_conditions",
            SourceKind::AirQuality => "air_quality",
            SourceKind::LifestyleIndex => "lifestyle_index",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request/response client for one external source
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch the raw payload for `location`.
    ///
    /// Transport errors, timeouts, non-2xx statuses and non-JSON bodies are
    /// all reported as [`SourceFetchError`].
    async fn fetch(&self, location: &Location) -> Result<Value, SourceFetchError>;
}

/// HTTP-backed source client
pub struct HttpSourceClient {
    kind: SourceKind,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSourceClient {
    pub fn new(
        kind: SourceKind,
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn url_for(&self, location: &Location) -> String {
        match self.kind {
            SourceKind::CurrentConditions => endpoints::current_conditions_url(
                &self.base_url,
                location.latitude,
                location.longitude,
                &self.api_key,
            ),
            SourceKind::AirQuality => endpoints::air_quality_url(
                &self.base_url,
                location.latitude,
                location.longitude,
                &self.api_key,
            ),
            SourceKind::LifestyleIndex => {
                endpoints::lifestyle_index_url(&self.base_url, &location.provider_key, &self.api_key)
            },
        }
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    // The URL carries the credential, so only the location is recorded.
    #[instrument(skip_all, fields(source = %self.kind, location = %location.name))]
    async fn fetch(&self, location: &Location) -> Result<Value, SourceFetchError> {
        let source_kind = self.kind;

        let response = self
            .client
            .get(self.url_for(location))
            .send()
            .await
            .map_err(|error| SourceFetchError::Http { source_kind, error })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceFetchError::Status {
                source_kind,
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| SourceFetchError::Http { source_kind, error })?;

        debug!(bytes = body.len(), "Source responded");

        serde_json::from_slice(&body).map_err(|error| SourceFetchError::Decode { source_kind, error })
    }
}

/// The three clients used for every location
#[derive(Clone)]
pub struct SourceSet {
    pub current_conditions: Arc<dyn SourceClient>,
    pub air_quality: Arc<dyn SourceClient>,
    pub lifestyle_index: Arc<dyn SourceClient>,
}

impl SourceSet {
    /// Build HTTP clients sharing one connection pool and the configured timeout.
    pub fn from_config(config: &SourceConfig) -> PipelineResult<Self> {
        let (openweather_key, accuweather_key) = config.require_credentials()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PipelineError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            current_conditions: Arc::new(HttpSourceClient::new(
                SourceKind::CurrentConditions,
                client.clone(),
                &config.openweather_base_url,
                openweather_key,
            )),
            air_quality: Arc::new(HttpSourceClient::new(
                SourceKind::AirQuality,
                client.clone(),
                &config.openweather_base_url,
                openweather_key,
            )),
            lifestyle_index: Arc::new(HttpSourceClient::new(
                SourceKind::LifestyleIndex,
                client,
                &config.accuweather_base_url,
                accuweather_key,
            )),
        })
    }
}
