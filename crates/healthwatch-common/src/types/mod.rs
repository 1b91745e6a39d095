//! Common types used across Healthwatch

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::{HealthwatchError, Result};

/// Fields a landed record must carry with a non-null value, in the order
/// they are checked.
pub const REQUIRED_FIELDS: [&str; 5] = ["timestamp", "location", "temp_current_f", "humidity", "aqi"];

/// A monitored location.
///
/// Defined at deploy time and never mutated afterwards. Accepts the short
/// `lat` / `lon` / `accu_key` spellings when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// Two-letter state code
    pub state: String,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
    /// Opaque identifier used only by the lifestyle-index source
    #[serde(alias = "accu_key")]
    pub provider_key: String,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        state: impl Into<String>,
        latitude: f64,
        longitude: f64,
        provider_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            latitude,
            longitude,
            provider_key: provider_key.into(),
        }
    }

    /// Check the invariants a catalog entry must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HealthwatchError::invalid_location(&self.name, "name is empty"));
        }

        if self.state.len() != 2 || !self.state.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(HealthwatchError::invalid_location(
                &self.name,
                format!("state '{}' is not a two-letter code", self.state),
            ));
        }

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(HealthwatchError::invalid_location(
                &self.name,
                format!("latitude {} out of range", self.latitude),
            ));
        }

        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(HealthwatchError::invalid_location(
                &self.name,
                format!("longitude {} out of range", self.longitude),
            ));
        }

        if self.provider_key.trim().is_empty() {
            return Err(HealthwatchError::invalid_location(&self.name, "provider_key is empty"));
        }

        Ok(())
    }
}

/// The unit of ingestion output.
///
/// Every key is always serialized; a signal a source failed to supply is
/// `null`. Numeric signals keep the representation the source used, so an
/// integer humidity stays `65` rather than becoming `65.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalRecord {
    /// RFC 3339 UTC timestamp taken at fetch time
    pub timestamp: String,
    pub location: String,
    pub state: String,
    pub temp_current_f: Option<Number>,
    pub humidity: Option<Number>,
    pub aqi: Option<i64>,
    pub cold_flu_index: Option<Number>,
    pub migraine_index: Option<Number>,
}

impl CanonicalRecord {
    /// Serialize as one newline-terminated JSON line, the append-channel wire format.
    pub fn to_ndjson_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn denver() -> Location {
        Location::new("Denver", "CO", 39.7392, -104.9903, "347810")
    }

    #[test]
    fn test_location_validate() {
        assert!(denver().validate().is_ok());

        let mut bad_state = denver();
        bad_state.state = "Colorado".to_string();
        assert!(bad_state.validate().is_err());

        let mut lowercase = denver();
        lowercase.state = "co".to_string();
        assert!(lowercase.validate().is_err());

        let mut bad_lat = denver();
        bad_lat.latitude = 91.0;
        assert!(bad_lat.validate().is_err());

        let mut no_key = denver();
        no_key.provider_key = " ".to_string();
        assert!(no_key.validate().is_err());
    }

    #[test]
    fn test_location_accepts_short_field_names() {
        let location: Location = serde_json::from_value(json!({
            "name": "Honolulu", "state": "HI", "lat": 21.3045, "lon": -157.8556, "accu_key": "585346"
        }))
        .unwrap();

        assert_eq!(location.latitude, 21.3045);
        assert_eq!(location.provider_key, "585346");
    }

    #[test]
    fn test_record_serializes_every_key() {
        let record = CanonicalRecord {
            timestamp: "2026-02-02T10:00:00.000000Z".to_string(),
            location: "Denver".to_string(),
            state: "CO".to_string(),
            temp_current_f: Some(Number::from_f64(41.5).unwrap()),
            humidity: Some(Number::from(65)),
            aqi: None,
            cold_flu_index: None,
            migraine_index: None,
        };

        let line = record.to_ndjson_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 8);
        assert_eq!(object["humidity"], json!(65));
        assert!(object["aqi"].is_null());
        assert!(object["migraine_index"].is_null());
    }

    #[test]
    fn test_record_rejects_extra_keys() {
        let result: std::result::Result<CanonicalRecord, _> = serde_json::from_value(json!({
            "timestamp": "t", "location": "x", "state": "CA",
            "temp_current_f": null, "humidity": null, "aqi": null,
            "cold_flu_index": null, "migraine_index": null,
            "wind": 3
        }));
        assert!(result.is_err());
    }
}
