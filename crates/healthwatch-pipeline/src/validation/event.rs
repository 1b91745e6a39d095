//! Object-created notifications
//!
//! Parses the S3 event notification that triggers validation. Keys arrive
//! URL-encoded (`+` for space, `%XX` escapes) and are decoded here.

use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

/// One created object named by a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCreated {
    pub bucket: String,
    pub key: String,
}

#[derive(Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<NotificationRecord>,
}

#[derive(Deserialize)]
struct NotificationRecord {
    #[serde(rename = "eventName", default)]
    event_name: Option<String>,
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Deserialize)]
struct ObjectEntity {
    key: String,
}

impl ObjectCreated {
    /// Every object-created record in a notification document.
    ///
    /// Records for other event types are ignored; a notification with no
    /// object-created records at all is an error.
    pub fn from_json(document: &str) -> PipelineResult<Vec<Self>> {
        let notification: Notification = serde_json::from_str(document)
            .map_err(|e| PipelineError::event(format!("not an S3 notification: {}", e)))?;

        let created = notification
            .records
            .into_iter()
            .filter(|record| {
                record
                    .event_name
                    .as_deref()
                    .map_or(true, |name| name.starts_with("ObjectCreated"))
            })
            .map(|record| {
                Ok(Self {
                    bucket: record.s3.bucket.name,
                    key: decode_key(&record.s3.object.key)?,
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        if created.is_empty() {
            return Err(PipelineError::event("notification contains no object-created records"));
        }

        Ok(created)
    }
}

fn decode_key(raw: &str) -> PipelineResult<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|key| key.into_owned())
        .map_err(|e| PipelineError::event(format!("undecodable object key '{}': {}", raw, e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_put_notification() {
        let document = r#"{
            "Records": [{
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": "weather-stream-data-etl", "arn": "arn:aws:s3:::weather-stream-data-etl"},
                    "object": {"key": "raw/2026/02/02/PUT-S3-PRNex-1", "size": 1024}
                }
            }]
        }"#;

        let created = ObjectCreated::from_json(document).unwrap();
        assert_eq!(
            created,
            vec![ObjectCreated {
                bucket: "weather-stream-data-etl".to_string(),
                key: "raw/2026/02/02/PUT-S3-PRNex-1".to_string(),
            }]
        );
    }

    #[test]
    fn test_keys_are_url_decoded() {
        let document = r#"{"Records": [{"s3": {"bucket": {"name": "b"}, "object": {"key": "raw/my+batch%3A1.json"}}}]}"#;
        let created = ObjectCreated::from_json(document).unwrap();
        assert_eq!(created[0].key, "raw/my batch:1.json");
    }

    #[test]
    fn test_every_record_is_returned() {
        let document = r#"{"Records": [
            {"eventName": "ObjectCreated:Put", "s3": {"bucket": {"name": "b"}, "object": {"key": "raw/a"}}},
            {"eventName": "ObjectRemoved:Delete", "s3": {"bucket": {"name": "b"}, "object": {"key": "raw/gone"}}},
            {"eventName": "ObjectCreated:CompleteMultipartUpload", "s3": {"bucket": {"name": "b"}, "object": {"key": "raw/b"}}}
        ]}"#;

        let keys: Vec<String> = ObjectCreated::from_json(document)
            .unwrap()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec!["raw/a", "raw/b"]);
    }

    #[test]
    fn test_test_event_is_rejected() {
        let document = r#"{"Service": "Amazon S3", "Event": "s3:TestEvent", "Bucket": "b"}"#;
        assert!(matches!(ObjectCreated::from_json(document), Err(PipelineError::Event(_))));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(ObjectCreated::from_json("not json").is_err());
    }
}
