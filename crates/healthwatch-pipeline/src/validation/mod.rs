//! Batch validation
//!
//! A landed batch is newline-delimited JSON. Every non-blank line becomes
//! exactly one outcome: valid lines go to the clean zone, the rest go to the
//! quarantine zone annotated with why they were rejected. Nothing in a batch
//! can make validation itself fail; only reading the batch or writing a zone
//! can.

pub mod event;
pub mod router;

use healthwatch_common::types::REQUIRED_FIELDS;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::ZoneConfig;
use crate::error::PipelineResult;
use crate::storage::ObjectStore;

pub use event::ObjectCreated;
pub use router::ZoneRouter;

/// Reported when a batch key is outside the landing prefix.
pub const NOT_IN_LANDING_PREFIX: &str = "not_in_raw_prefix";

/// Result of parsing one landed line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Parsed(Map<String, Value>),
    ParseFailed { raw: String, reason: String },
}

/// Parse one line as a JSON object.
///
/// Well-formed JSON that is not an object is a parse failure too.
pub fn parse_line(line: &str) -> ParsedLine {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(record)) => ParsedLine::Parsed(record),
        Ok(other) => ParsedLine::ParseFailed {
            raw: line.to_string(),
            reason: format!("expected a JSON object, found {}", json_type_name(&other)),
        },
        Err(e) => ParsedLine::ParseFailed {
            raw: line.to_string(),
            reason: e.to_string(),
        },
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// First required field that is absent or null, in [`REQUIRED_FIELDS`] order.
pub fn first_missing_field(record: &Map<String, Value>) -> Option<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .find(|field| record.get(*field).map_or(true, Value::is_null))
}

/// One quarantine-zone entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuarantineEntry {
    /// Well-formed record missing a required field
    SchemaViolation { error: String, data: Value },
    /// Line that is not a JSON object, kept verbatim
    Unparseable { error: String, raw: String },
}

impl QuarantineEntry {
    pub fn error(&self) -> &str {
        match self {
            QuarantineEntry::SchemaViolation { error, .. } | QuarantineEntry::Unparseable { error, .. } => {
                error
            },
        }
    }
}

/// Classification of one line
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(Map<String, Value>),
    Invalid(QuarantineEntry),
}

/// Parse and field-check one line.
pub fn classify_line(line: &str) -> ValidationOutcome {
    match parse_line(line) {
        ParsedLine::Parsed(record) => match first_missing_field(&record) {
            None => ValidationOutcome::Valid(record),
            Some(field) => ValidationOutcome::Invalid(QuarantineEntry::SchemaViolation {
                error: format!("Missing: {}", field),
                data: Value::Object(record),
            }),
        },
        ParsedLine::ParseFailed { raw, reason } => {
            ValidationOutcome::Invalid(QuarantineEntry::Unparseable { error: reason, raw })
        },
    }
}

/// A batch split into its valid and invalid partitions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedBatch {
    pub valid: Vec<Map<String, Value>>,
    pub invalid: Vec<QuarantineEntry>,
}

impl ClassifiedBatch {
    /// Classify every non-blank line of `batch`.
    ///
    /// A line that is not valid UTF-8 is quarantined as unparseable, with the
    /// undecodable bytes replaced in its `raw` text.
    pub fn from_bytes(batch: &[u8]) -> Self {
        let mut classified = Self::default();

        for line in split_lines(batch) {
            let outcome = match std::str::from_utf8(line) {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => classify_line(text),
                Err(e) => ValidationOutcome::Invalid(QuarantineEntry::Unparseable {
                    error: format!("invalid UTF-8: {}", e),
                    raw: String::from_utf8_lossy(line).into_owned(),
                }),
            };

            match outcome {
                ValidationOutcome::Valid(record) => classified.valid.push(record),
                ValidationOutcome::Invalid(entry) => classified.invalid.push(entry),
            }
        }

        classified
    }

    /// Valid records as single-line JSON joined by `\n`, or `None` when there are none.
    pub fn clean_body(&self) -> serde_json::Result<Option<String>> {
        if self.valid.is_empty() {
            return Ok(None);
        }

        let lines = self
            .valid
            .iter()
            .map(serde_json::to_string)
            .collect::<serde_json::Result<Vec<_>>>()?;

        Ok(Some(lines.join("\n")))
    }

    /// Invalid entries as one JSON array, or `None` when there are none.
    pub fn quarantine_body(&self) -> serde_json::Result<Option<String>> {
        if self.invalid.is_empty() {
            return Ok(None);
        }

        serde_json::to_string(&self.invalid).map(Some)
    }
}

/// Split a batch on `\n`, `\r\n` or a lone `\r`, without the terminators.
pub fn split_lines(batch: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut rest = batch;

    while let Some(end) = rest.iter().position(|&b| b == b'\n' || b == b'\r') {
        lines.push(&rest[..end]);
        let terminator = if rest[end..].starts_with(b"\r\n") { 2 } else { 1 };
        rest = &rest[end + terminator..];
    }

    if !rest.is_empty() {
        lines.push(rest);
    }

    lines
}

/// Last `/`-separated segment of a batch key.
pub fn batch_filename(batch_key: &str) -> &str {
    batch_key.rsplit('/').next().unwrap_or(batch_key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Success,
    Skipped,
}

/// Summary of one validator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub processed_key: String,
    pub clean_count: usize,
    pub error_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationReport {
    fn skipped(batch_key: &str) -> Self {
        Self {
            status: ValidationStatus::Skipped,
            processed_key: batch_key.to_string(),
            clean_count: 0,
            error_count: 0,
            reason: Some(NOT_IN_LANDING_PREFIX.to_string()),
        }
    }
}

/// Validates landed batches and routes their partitions into zones
pub struct BatchValidator {
    landing_prefix: String,
    router: ZoneRouter,
}

impl BatchValidator {
    pub fn new(zones: &ZoneConfig, destination: Arc<dyn ObjectStore>) -> Self {
        Self {
            landing_prefix: zones.landing_prefix.clone(),
            router: ZoneRouter::new(destination, &zones.clean_prefix, &zones.quarantine_prefix),
        }
    }

    /// Whether `key` is a landing-zone object this validator should process.
    pub fn is_landing_key(&self, key: &str) -> bool {
        key.starts_with(&self.landing_prefix)
    }

    /// Validate one batch and write its clean and quarantine partitions.
    ///
    /// Keys outside the landing prefix return a `skipped` report without any writes.
    #[instrument(skip(self, batch_bytes), fields(bytes = batch_bytes.len()))]
    pub async fn validate(&self, batch_key: &str, batch_bytes: &[u8]) -> PipelineResult<ValidationReport> {
        if !self.is_landing_key(batch_key) {
            info!(landing_prefix = %self.landing_prefix, "Key outside landing prefix, skipping");
            return Ok(ValidationReport::skipped(batch_key));
        }

        let batch = ClassifiedBatch::from_bytes(batch_bytes);

        for entry in &batch.invalid {
            warn!(reason = %entry.error(), "Record quarantined");
        }

        let clean_body = batch.clean_body().map_err(healthwatch_common::HealthwatchError::from)?;
        let quarantine_body = batch
            .quarantine_body()
            .map_err(healthwatch_common::HealthwatchError::from)?;

        self.router
            .route(batch_filename(batch_key), clean_body, quarantine_body)
            .await?;

        let report = ValidationReport {
            status: ValidationStatus::Success,
            processed_key: batch_key.to_string(),
            clean_count: batch.valid.len(),
            error_count: batch.invalid.len(),
            reason: None,
        };

        info!(
            clean_count = report.clean_count,
            error_count = report.error_count,
            "Batch validated"
        );

        Ok(report)
    }

    /// Read a landing object from `source` and validate it.
    ///
    /// The landing-prefix check runs before the read, so a skipped key is never fetched.
    pub async fn process_object(&self, source: &dyn ObjectStore, batch_key: &str) -> PipelineResult<ValidationReport> {
        if !self.is_landing_key(batch_key) {
            return self.validate(batch_key, &[]).await;
        }

        let body = source.get(batch_key).await?;
        self.validate(batch_key, &body).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_record() -> Value {
        json!({
            "timestamp": "2026-02-02T10:00:00.000000Z",
            "location": "Miami",
            "state": "FL",
            "temp_current_f": 79.2,
            "humidity": 70,
            "aqi": 1,
            "cold_flu_index": null,
            "migraine_index": null
        })
    }

    #[test]
    fn test_complete_record_is_valid_regardless_of_optional_fields() {
        let line = complete_record().to_string();
        assert!(matches!(classify_line(&line), ValidationOutcome::Valid(_)));

        let mut without_optional = complete_record();
        let object = without_optional.as_object_mut().unwrap();
        object.remove("cold_flu_index");
        object.remove("migraine_index");
        assert!(matches!(
            classify_line(&without_optional.to_string()),
            ValidationOutcome::Valid(_)
        ));
    }

    #[test]
    fn test_null_required_field_is_reported() {
        let mut record = complete_record();
        record["aqi"] = Value::Null;

        match classify_line(&record.to_string()) {
            ValidationOutcome::Invalid(QuarantineEntry::SchemaViolation { error, data }) => {
                assert_eq!(error, "Missing: aqi");
                assert_eq!(data, record);
            },
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_first_missing_field_follows_required_order() {
        let mut record = complete_record();
        let object = record.as_object_mut().unwrap();
        object.remove("aqi");
        object.insert("humidity".to_string(), Value::Null);
        object.remove("location");

        assert_eq!(first_missing_field(object), Some("location"));
    }

    #[test]
    fn test_empty_string_is_present() {
        let mut record = complete_record();
        record["location"] = json!("");
        assert!(matches!(classify_line(&record.to_string()), ValidationOutcome::Valid(_)));
    }

    #[test]
    fn test_malformed_line_keeps_raw_text() {
        match classify_line("{\"bad json") {
            ValidationOutcome::Invalid(QuarantineEntry::Unparseable { error, raw }) => {
                assert_eq!(raw, "{\"bad json");
                assert!(!error.is_empty());
            },
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_json_is_unparseable() {
        match parse_line("[1, 2, 3]") {
            ParsedLine::ParseFailed { raw, reason } => {
                assert_eq!(raw, "[1, 2, 3]");
                assert_eq!(reason, "expected a JSON object, found array");
            },
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let batch = format!("\n  \r\n{}\n\t\n", complete_record());
        let classified = ClassifiedBatch::from_bytes(batch.as_bytes());
        assert_eq!(classified.valid.len(), 1);
        assert!(classified.invalid.is_empty());
    }

    #[test]
    fn test_crlf_lines_parse() {
        let batch = format!("{}\r\n{}\r\n", complete_record(), complete_record());
        let classified = ClassifiedBatch::from_bytes(batch.as_bytes());
        assert_eq!(classified.valid.len(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_quarantined() {
        let mut batch = complete_record().to_string().into_bytes();
        batch.push(b'\n');
        batch.extend_from_slice(&[0xff, 0xfe, b'{']);

        let classified = ClassifiedBatch::from_bytes(&batch);
        assert_eq!(classified.valid.len(), 1);
        assert_eq!(classified.invalid.len(), 1);
    }

    #[test]
    fn test_invalid_utf8_inside_string_value_is_not_cleaned() {
        let mut line = br#"{"timestamp":"t","location":"Caf"#.to_vec();
        line.push(0xE9);
        line.extend_from_slice(br#"","state":"CA","temp_current_f":1,"humidity":1,"aqi":1}"#);

        let classified = ClassifiedBatch::from_bytes(&line);
        assert!(classified.valid.is_empty());
        assert_eq!(classified.clean_body().unwrap(), None);

        match &classified.invalid[..] {
            [QuarantineEntry::Unparseable { error, raw }] => {
                assert!(error.starts_with("invalid UTF-8"));
                assert!(raw.contains("\"location\":\"Caf\u{FFFD}\""));
            },
            other => panic!("expected one unparseable entry, got {:?}", other),
        }
    }

    #[test]
    fn test_lone_carriage_return_separates_lines() {
        let batch = format!("{}\r{}\r\n{}", complete_record(), complete_record(), complete_record());
        let classified = ClassifiedBatch::from_bytes(batch.as_bytes());
        assert_eq!(classified.valid.len(), 3);
        assert!(classified.invalid.is_empty());
    }

    #[test]
    fn test_split_lines_terminators() {
        let lines = split_lines(b"a\nb\r\nc\rd\n\ne");
        let expected: Vec<&[u8]> = ["a", "b", "c", "d", "", "e"].iter().map(|s| s.as_bytes()).collect();
        assert_eq!(lines, expected);
        assert!(split_lines(b"").is_empty());
        assert_eq!(split_lines(b"x\r\n"), vec![&b"x"[..]]);
    }

    #[test]
    fn test_large_numbers_pass_through_unchanged() {
        let line = r#"{"timestamp":"t","location":"Houston","temp_current_f":1e400,"humidity":123456789012345678901234567890,"aqi":1}"#;
        let classified = ClassifiedBatch::from_bytes(line.as_bytes());

        assert!(classified.invalid.is_empty());
        assert_eq!(classified.clean_body().unwrap().as_deref(), Some(line));
    }

    #[test]
    fn test_clean_body_preserves_key_order() {
        let line = r#"{"timestamp":"t","location":"Denver","state":"CO","temp_current_f":40,"humidity":20,"aqi":3,"cold_flu_index":null,"migraine_index":2}"#;
        let classified = ClassifiedBatch::from_bytes(format!("{}\n{}", line, line).as_bytes());

        let body = classified.clean_body().unwrap().unwrap();
        assert_eq!(body, format!("{}\n{}", line, line));
        assert_eq!(classified.quarantine_body().unwrap(), None);
    }

    #[test]
    fn test_quarantine_body_shapes() {
        let mut missing = complete_record();
        missing.as_object_mut().unwrap().remove("timestamp");
        let batch = format!("{}\nnot json\n", missing);

        let classified = ClassifiedBatch::from_bytes(batch.as_bytes());
        assert_eq!(classified.clean_body().unwrap(), None);

        let body: Value = serde_json::from_str(&classified.quarantine_body().unwrap().unwrap()).unwrap();
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["error"], "Missing: timestamp");
        assert_eq!(entries[0]["data"]["location"], "Miami");
        assert!(entries[0].get("raw").is_none());
        assert_eq!(entries[1]["raw"], "not json");
        assert!(entries[1].get("data").is_none());
    }

    #[test]
    fn test_batch_filename() {
        assert_eq!(batch_filename("raw/2026/02/02/10/PUT-S3-PRNex-1-2026"), "PUT-S3-PRNex-1-2026");
        assert_eq!(batch_filename("raw/batch.json"), "batch.json");
        assert_eq!(batch_filename("batch.json"), "batch.json");
    }

    #[test]
    fn test_skipped_report_serialization() {
        let report = ValidationReport::skipped("silver/batch.json");
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "status": "skipped",
                "processed_key": "silver/batch.json",
                "clean_count": 0,
                "error_count": 0,
                "reason": "not_in_raw_prefix"
            })
        );
    }
}
