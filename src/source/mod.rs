//! Data sources for the dashboard.
//!
//! A [`DataSource`] supplies the raw survey records and, when it fronts the
//! dashboard backend, the pre-aggregated count maps served by the
//! `/api/*` endpoints:
//!
//! - [`HttpSource`]: synchronous `ureq` client against a running backend
//! - [`FileSource`]: a JSON array of records on disk (no aggregate endpoints)
//!
//! Payload decoding lives here too so both sources agree on how JSON
//! scalars become record values.

pub mod file;
pub mod http;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use file::FileSource;
pub use http::HttpSource;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to obtain data from a source.
///
/// Load-time failures are fatal to dashboard initialization; the same
/// type describes a failed aggregate endpoint, which only fails the metric
/// that depends on it.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Transport error, non-success status, or unreadable file.
    #[error("source unavailable ({endpoint}): {reason}")]
    SourceUnavailable { endpoint: String, reason: String },
    /// The record endpoint answered with zero records.
    #[error("no records received from {endpoint}")]
    EmptyDataset { endpoint: String },
    /// The payload was not shaped the way the endpoint promises.
    #[error("malformed payload from {endpoint}: {reason}")]
    MalformedPayload { endpoint: String, reason: String },
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Backend endpoints consumed by the dashboard (all `GET`, no body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Data,
    ReasonsAnalysis,
    YearWiseAnalysis,
    Attitude,
    Effectiveness,
    OptionalFrequency,
    FactorsInfluencing,
    CompensationMethods,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::Data,
        Endpoint::ReasonsAnalysis,
        Endpoint::YearWiseAnalysis,
        Endpoint::Attitude,
        Endpoint::Effectiveness,
        Endpoint::OptionalFrequency,
        Endpoint::FactorsInfluencing,
        Endpoint::CompensationMethods,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Data => "/api/data",
            Self::ReasonsAnalysis => "/api/reasons_analysis",
            Self::YearWiseAnalysis => "/api/year_wise_analysis",
            Self::Attitude => "/api/attitude",
            Self::Effectiveness => "/api/effectiveness",
            Self::OptionalFrequency => "/api/optional_frequency",
            Self::FactorsInfluencing => "/api/factors_influencing",
            Self::CompensationMethods => "/api/compensation_methods",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// One flat survey record exactly as received: raw field name → value.
///
/// Keys are not yet alias-resolved; see [`crate::store::Record::from_raw`].
pub type RawRecord = BTreeMap<String, String>;

/// An ordered `label → count` map.
///
/// JSON objects are deserialized in document order so that ties in a
/// descending-frequency sort fall back to the order the server produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountMap {
    entries: Vec<(String, u64)>,
}

impl CountMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`, keeping its original position.
    pub fn insert(&mut self, key: impl Into<String>, count: u64) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = count,
            None => self.entries.push((key, count)),
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|&(_, count)| count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for CountMap {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut map = CountMap::new();
        for (key, count) in iter {
            map.insert(key, count);
        }
        map
    }
}

impl<'de> Deserialize<'de> for CountMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountMapVisitor;

        impl<'de> Visitor<'de> for CountMapVisitor {
            type Value = CountMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping labels to non-negative counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<CountMap, A::Error> {
                let mut map = CountMap::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    let count = value
                        .as_u64()
                        .or_else(|| {
                            value
                                .as_f64()
                                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                                .map(|f| f as u64)
                        })
                        .ok_or_else(|| {
                            de::Error::custom(format!("count for '{key}' is not a whole number"))
                        })?;
                    map.insert(key, count);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(CountMapVisitor)
    }
}

/// Payload of `/api/reasons_analysis`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReasonsAnalysis {
    #[serde(default)]
    pub attending: CountMap,
    #[serde(default)]
    pub skipping: CountMap,
}

/// One row of `/api/year_wise_analysis`: a (year, behavior) pair and its count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrossTabRow {
    #[serde(rename = "Current year of study", default)]
    pub year: String,
    #[serde(rename = "Class attendance behavior", default)]
    pub behavior: String,
    pub count: u64,
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Anything that can supply the dashboard's inputs.
pub trait DataSource {
    /// Human-readable location, used in errors and the event log.
    fn describe(&self) -> String;

    /// Fetch every survey record (`/api/data`).
    fn fetch_records(&self) -> Result<Vec<RawRecord>, LoadError>;

    /// Fetch `/api/reasons_analysis`.
    fn fetch_reasons(&self) -> Result<ReasonsAnalysis, LoadError>;

    /// Fetch `/api/year_wise_analysis`.
    fn fetch_year_wise(&self) -> Result<Vec<CrossTabRow>, LoadError>;

    /// Fetch one of the plain count-map endpoints.
    fn fetch_count_map(&self, endpoint: Endpoint) -> Result<CountMap, LoadError>;

    /// Whether the pre-aggregated endpoints exist at all. Sources that
    /// return `false` are always aggregated locally.
    fn serves_aggregates(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Record decoding
// ---------------------------------------------------------------------------

/// Decode a `/api/data` payload: a JSON array of flat objects.
pub fn parse_records(endpoint: &str, payload: Value) -> Result<Vec<RawRecord>, LoadError> {
    let Value::Array(items) = payload else {
        return Err(LoadError::MalformedPayload {
            endpoint: endpoint.to_string(),
            reason: "expected a JSON array of records".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key, v)))
                .collect()),
            _ => Err(LoadError::MalformedPayload {
                endpoint: endpoint.to_string(),
                reason: format!("record {i} is not an object"),
            }),
        })
        .collect()
}

/// Render a JSON scalar the way a browser would when used as a string key.
///
/// Whole floats lose their fraction (`4.0` → `"4"`); `null` and nested
/// values are treated as absent.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            } else {
                Some(n.to_string())
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn count_map_keeps_document_order() {
        let map: CountMap = serde_json::from_str(r#"{"b": 3, "a": 5, "c": 3}"#).unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(map.get("a"), Some(5));
        assert_eq!(map.get("z"), None);
    }

    #[test]
    fn count_map_accepts_whole_floats() {
        let map: CountMap = serde_json::from_str(r#"{"1": 2.0}"#).unwrap();
        assert_eq!(map.get("1"), Some(2));
    }

    #[test]
    fn count_map_rejects_fractional_counts() {
        let result: Result<CountMap, _> = serde_json::from_str(r#"{"1": 2.5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn count_map_insert_overwrites_in_place() {
        let mut map: CountMap = [("x", 1), ("y", 2)].into_iter().collect();
        map.insert("x", 9);
        let entries: Vec<(&str, u64)> = map.iter().collect();
        assert_eq!(entries, vec![("x", 9), ("y", 2)]);
    }

    #[test]
    fn cross_tab_rows_use_survey_column_names() {
        let rows: Vec<CrossTabRow> = serde_json::from_value(json!([
            {"Current year of study": "First Year", "Class attendance behavior": "I attend most classes", "count": 4}
        ]))
        .unwrap();
        assert_eq!(rows[0].year, "First Year");
        assert_eq!(rows[0].count, 4);
    }

    #[test]
    fn parse_records_stringifies_scalars() {
        let payload = json!([
            {"Major": "CS", "Attitude toward attending classes": 4, "Score": 4.0, "Note": null}
        ]);
        let records = parse_records("/api/data", payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Major"], "CS");
        assert_eq!(records[0]["Attitude toward attending classes"], "4");
        assert_eq!(records[0]["Score"], "4");
        assert!(!records[0].contains_key("Note"));
    }

    #[test]
    fn parse_records_rejects_non_array() {
        let err = parse_records("/api/data", json!({"error": "boom"})).unwrap_err();
        assert!(matches!(err, LoadError::MalformedPayload { .. }));
    }

    #[test]
    fn parse_records_rejects_non_object_items() {
        let err = parse_records("/api/data", json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("record 0"));
    }

    #[test]
    fn endpoint_paths_are_api_routes() {
        for endpoint in Endpoint::ALL {
            assert!(endpoint.path().starts_with("/api/"));
        }
    }
}
