//! Record normalization
//!
//! Merges the three raw source payloads for one location into a
//! [`CanonicalRecord`]. Every lookup is total: a missing key, an index past
//! the end, or a value of the wrong type yields `None` for that field.

use healthwatch_common::types::{CanonicalRecord, Location};
use serde_json::{Number, Value};

/// Display name of the cold/flu entry in the lifestyle-index payload.
pub const COLD_FLU_INDEX_NAME: &str = "Common Cold Forecast";

/// Display name of the migraine entry in the lifestyle-index payload.
pub const MIGRAINE_INDEX_NAME: &str = "Migraine Headache Forecast";

/// One step of a nested lookup
#[derive(Debug, Clone, Copy)]
pub enum PathSegment<'a> {
    Key(&'a str),
    Index(usize),
}

use PathSegment::{Index, Key};

/// Walk `path` into `value`, returning `None` at the first missing step.
pub fn lookup<'v>(value: &'v Value, path: &[PathSegment<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, segment| match segment {
        Key(key) => current.as_object()?.get(*key),
        Index(index) => current.as_array()?.get(*index),
    })
}

fn number_at(value: &Value, path: &[PathSegment<'_>]) -> Option<Number> {
    match lookup(value, path)? {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

/// Value of the lifestyle entry whose `Name` equals `name` exactly.
///
/// Non-array payloads and absent entries both yield `None`.
pub fn lifestyle_index(payload: &Value, name: &str) -> Option<Number> {
    payload
        .as_array()?
        .iter()
        .find(|entry| entry.get("Name").and_then(Value::as_str) == Some(name))
        .and_then(|entry| match entry.get("Value")? {
            Value::Number(n) => Some(n.clone()),
            _ => None,
        })
}

/// Build the canonical record for one location.
///
/// `timestamp` is supplied by the caller so normalization stays pure.
pub fn normalize(
    location: &Location,
    timestamp: impl Into<String>,
    current_conditions: &Value,
    air_quality: &Value,
    lifestyle: &Value,
) -> CanonicalRecord {
    CanonicalRecord {
        timestamp: timestamp.into(),
        location: location.name.clone(),
        state: location.state.clone(),
        temp_current_f: number_at(current_conditions, &[Key("main"), Key("temp")]),
        humidity: number_at(current_conditions, &[Key("main"), Key("humidity")]),
        aqi: lookup(air_quality, &[Key("list"), Index(0), Key("main"), Key("aqi")])
            .and_then(Value::as_i64),
        cold_flu_index: lifestyle_index(lifestyle, COLD_FLU_INDEX_NAME),
        migraine_index: lifestyle_index(lifestyle, MIGRAINE_INDEX_NAME),
    }
}
