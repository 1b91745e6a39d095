//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

// ============================================================================
// Source Configuration Constants
// ============================================================================

/// Default base URL for the current-conditions and air-quality sources.
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Default base URL for the lifestyle-index source.
pub const DEFAULT_ACCUWEATHER_BASE_URL: &str = "https://dataservice.accuweather.com";

/// Default per-request timeout in seconds.
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

/// Default number of locations processed at once. 1 keeps the run sequential.
pub const DEFAULT_MAX_CONCURRENCY: usize = 1;

// ============================================================================
// Delivery / Zone Configuration Constants
// ============================================================================

/// Default append-channel (Firehose delivery stream) name.
pub const DEFAULT_DELIVERY_STREAM: &str = "PUT-S3-PRNex";

/// Default AWS region.
pub const DEFAULT_AWS_REGION: &str = "us-west-2";

/// Default bucket receiving clean and quarantine objects.
pub const DEFAULT_DEST_BUCKET: &str = "weather-stream-data-etl";

/// Prefix under which freshly delivered batches land.
pub const DEFAULT_LANDING_PREFIX: &str = "raw/";

/// Prefix of the clean zone.
pub const DEFAULT_CLEAN_PREFIX: &str = "silver/";

/// Prefix of the quarantine zone.
pub const DEFAULT_QUARANTINE_PREFIX: &str = "quarantine/";

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub sources: SourceConfig,
    pub delivery: DeliveryConfig,
    pub zones: ZoneConfig,
    /// Optional catalog file replacing the built-in locations
    pub locations_file: Option<PathBuf>,
}

/// External data source configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub openweather_base_url: String,
    #[serde(skip_serializing, default)]
    pub openweather_api_key: Option<String>,
    pub accuweather_base_url: String,
    #[serde(skip_serializing, default)]
    pub accuweather_api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
}

// Keys stay out of logs.
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("openweather_base_url", &self.openweather_base_url)
            .field("openweather_api_key", &self.openweather_api_key.as_ref().map(|_| "***"))
            .field("accuweather_base_url", &self.accuweather_base_url)
            .field("accuweather_api_key", &self.accuweather_api_key.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

/// Append-channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub stream_name: String,
    pub region: String,
}

/// Landing / clean / quarantine layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub dest_bucket: String,
    pub landing_prefix: String,
    pub clean_prefix: String,
    pub quarantine_prefix: String,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Ingestion needs both credentials; validation needs neither.
    pub fn require_credentials(&self) -> PipelineResult<(&str, &str)> {
        let openweather = non_empty(self.openweather_api_key.as_deref())
            .ok_or_else(|| PipelineError::config("OPENWEATHER_API_KEY is not set"))?;
        let accuweather = non_empty(self.accuweather_api_key.as_deref())
            .ok_or_else(|| PipelineError::config("ACCUWEATHER_API_KEY is not set"))?;
        Ok((openweather, accuweather))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            dest_bucket: DEFAULT_DEST_BUCKET.to_string(),
            landing_prefix: DEFAULT_LANDING_PREFIX.to_string(),
            clean_prefix: DEFAULT_CLEAN_PREFIX.to_string(),
            quarantine_prefix: DEFAULT_QUARANTINE_PREFIX.to_string(),
        }
    }
}

impl ZoneConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.dest_bucket.is_empty() {
            return Err(PipelineError::config("Destination bucket cannot be empty"));
        }

        let prefixes = [
            ("landing", &self.landing_prefix),
            ("clean", &self.clean_prefix),
            ("quarantine", &self.quarantine_prefix),
        ];

        for (zone, prefix) in prefixes {
            if prefix.is_empty() || !prefix.ends_with('/') {
                return Err(PipelineError::config(format!(
                    "The {} prefix '{}' must be non-empty and end with '/'",
                    zone, prefix
                )));
            }
        }

        if self.clean_prefix == self.quarantine_prefix {
            return Err(PipelineError::config(
                "Clean and quarantine prefixes must differ",
            ));
        }

        // Output under the landing prefix would re-trigger the validator on its own writes.
        for (zone, prefix) in &prefixes[1..] {
            if prefix.starts_with(self.landing_prefix.as_str())
                || self.landing_prefix.starts_with(prefix.as_str())
            {
                return Err(PipelineError::config(format!(
                    "The {} prefix '{}' overlaps the landing prefix '{}'",
                    zone, prefix, self.landing_prefix
                )));
            }
        }

        Ok(())
    }
}

impl PipelineConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> PipelineResult<Self> {
        dotenvy::dotenv().ok();

        let config = PipelineConfig {
            sources: SourceConfig {
                openweather_base_url: env_or("OPENWEATHER_BASE_URL", DEFAULT_OPENWEATHER_BASE_URL),
                openweather_api_key: std::env::var("OPENWEATHER_API_KEY").ok(),
                accuweather_base_url: env_or("ACCUWEATHER_BASE_URL", DEFAULT_ACCUWEATHER_BASE_URL),
                accuweather_api_key: std::env::var("ACCUWEATHER_API_KEY").ok(),
                timeout_secs: env_parse("HEALTHWATCH_SOURCE_TIMEOUT_SECS")
                    .unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECS),
                max_concurrency: env_parse("HEALTHWATCH_MAX_CONCURRENCY")
                    .unwrap_or(DEFAULT_MAX_CONCURRENCY),
            },
            delivery: DeliveryConfig {
                stream_name: env_or("HEALTHWATCH_DELIVERY_STREAM", DEFAULT_DELIVERY_STREAM),
                region: env_or("AWS_REGION", DEFAULT_AWS_REGION),
            },
            zones: ZoneConfig {
                dest_bucket: env_or("HEALTHWATCH_DEST_BUCKET", DEFAULT_DEST_BUCKET),
                landing_prefix: env_or("HEALTHWATCH_LANDING_PREFIX", DEFAULT_LANDING_PREFIX),
                clean_prefix: env_or("HEALTHWATCH_CLEAN_PREFIX", DEFAULT_CLEAN_PREFIX),
                quarantine_prefix: env_or(
                    "HEALTHWATCH_QUARANTINE_PREFIX",
                    DEFAULT_QUARANTINE_PREFIX,
                ),
            },
            locations_file: std::env::var("HEALTHWATCH_LOCATIONS_FILE")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> PipelineResult<()> {
        if self.sources.timeout_secs == 0 {
            return Err(PipelineError::config("Source timeout must be greater than 0"));
        }

        if self.sources.max_concurrency == 0 {
            return Err(PipelineError::config("Max concurrency must be greater than 0"));
        }

        if self.delivery.stream_name.is_empty() {
            return Err(PipelineError::config("Delivery stream name cannot be empty"));
        }

        self.zones.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig {
                openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
                openweather_api_key: None,
                accuweather_base_url: DEFAULT_ACCUWEATHER_BASE_URL.to_string(),
                accuweather_api_key: None,
                timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
                max_concurrency: DEFAULT_MAX_CONCURRENCY,
            },
            delivery: DeliveryConfig {
                stream_name: DEFAULT_DELIVERY_STREAM.to_string(),
                region: DEFAULT_AWS_REGION.to_string(),
            },
            zones: ZoneConfig::default(),
            locations_file: None,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.zones.landing_prefix, "raw/");
        assert_eq!(config.zones.clean_prefix, "silver/");
        assert_eq!(config.zones.quarantine_prefix, "quarantine/");
        assert_eq!(config.sources.max_concurrency, 1);
    }

    #[test]
    fn test_zone_prefixes_must_end_with_slash() {
        let zones = ZoneConfig {
            landing_prefix: "raw".to_string(),
            ..ZoneConfig::default()
        };
        assert!(zones.validate().is_err());
    }

    #[test]
    fn test_output_under_landing_prefix_is_rejected() {
        let zones = ZoneConfig {
            clean_prefix: "raw/silver/".to_string(),
            ..ZoneConfig::default()
        };
        assert!(zones.validate().is_err());

        let same = ZoneConfig {
            quarantine_prefix: "silver/".to_string(),
            ..ZoneConfig::default()
        };
        assert!(same.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut config = PipelineConfig::default();
        config.sources.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_required_for_ingestion() {
        let mut config = PipelineConfig::default();
        assert!(config.sources.require_credentials().is_err());

        config.sources.openweather_api_key = Some("ow".to_string());
        config.sources.accuweather_api_key = Some("  ".to_string());
        assert!(config.sources.require_credentials().is_err());

        config.sources.accuweather_api_key = Some("aw".to_string());
        assert_eq!(config.sources.require_credentials().unwrap(), ("ow", "aw"));
    }

    #[test]
    fn test_debug_hides_api_keys() {
        let mut config = PipelineConfig::default();
        config.sources.openweather_api_key = Some("super-secret".to_string());
        let rendered = format!("{:?}", config.sources);
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        std::env::set_var("HEALTHWATCH_MAX_CONCURRENCY", "4");
        std::env::set_var("HEALTHWATCH_CLEAN_PREFIX", "clean/");
        std::env::set_var("HEALTHWATCH_SOURCE_TIMEOUT_SECS", "not-a-number");

        let config = PipelineConfig::load().expect("config should load");
        assert_eq!(config.sources.max_concurrency, 4);
        assert_eq!(config.zones.clean_prefix, "clean/");
        assert_eq!(config.sources.timeout_secs, DEFAULT_SOURCE_TIMEOUT_SECS);

        std::env::remove_var("HEALTHWATCH_MAX_CONCURRENCY");
        std::env::remove_var("HEALTHWATCH_CLEAN_PREFIX");
        std::env::remove_var("HEALTHWATCH_SOURCE_TIMEOUT_SECS");
    }
}
