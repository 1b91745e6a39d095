//! Monitored location catalog

use healthwatch_common::types::Location;
use healthwatch_common::{HealthwatchError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Static list of monitored locations.
///
/// Built once per process and never mutated.
#[derive(Debug, Clone)]
pub struct LocationCatalog {
    locations: Vec<Location>,
}

/// `{ "locations": [...] }` / `[[locations]]` file shape
#[derive(Deserialize)]
struct CatalogFile {
    locations: Vec<Location>,
}

impl LocationCatalog {
    /// Build a catalog, rejecting empty lists, duplicate names, and invalid entries.
    pub fn new(locations: Vec<Location>) -> Result<Self> {
        if locations.is_empty() {
            return Err(HealthwatchError::Config(
                "Location catalog cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for location in &locations {
            location.validate()?;
            if !seen.insert(location.name.as_str()) {
                return Err(HealthwatchError::invalid_location(
                    &location.name,
                    "duplicate name in catalog",
                ));
            }
        }

        Ok(Self { locations })
    }

    /// Load a catalog from a `.json` or `.toml` file.
    ///
    /// JSON may be a bare array or `{ "locations": [...] }`; TOML uses `[[locations]]` tables.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        // No untagged enum here: buffered numbers fail to deserialize with arbitrary_precision.
        let locations: Vec<Location> = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str::<CatalogFile>(&contents)
                .map_err(|e| HealthwatchError::Parse(format!("{}: {}", path.display(), e)))?
                .locations,
            Some("json") if contents.trim_start().starts_with('[') => serde_json::from_str(&contents)?,
            Some("json") => serde_json::from_str::<CatalogFile>(&contents)?.locations,
            other => {
                return Err(HealthwatchError::Config(format!(
                    "Unsupported catalog format '{}' for {}",
                    other.unwrap_or(""),
                    path.display()
                )))
            },
        };

        info!(path = %path.display(), count = locations.len(), "Loaded location catalog");
        Self::new(locations)
    }

    /// Use `path` when given, the built-in catalog otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    /// The nine cities monitored by the production deployment.
    pub fn builtin() -> Self {
        let locations = [
            ("Honolulu", "HI", 21.3045, -157.8556, "585346"),
            ("Las Vegas", "NV", 36.1674, -115.1484, "558374"),
            ("Petaluma", "CA", 38.2331, -122.6336, "552789"),
            ("Richmond", "VA", 37.5407, -77.4360, "331252"),
            ("New York", "NY", 40.7128, -74.0060, "349727"),
            ("Chicago", "IL", 41.8781, -87.6298, "348308"),
            ("Denver", "CO", 39.7392, -104.9903, "347810"),
            ("Miami", "FL", 25.7617, -80.1918, "347936"),
            ("Houston", "TX", 29.7604, -95.3698, "351197"),
        ]
        .into_iter()
        .map(|(name, state, lat, lon, key)| Location::new(name, state, lat, lon, key))
        .collect();

        Self { locations }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
