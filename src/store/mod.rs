//! Record store: the immutable, ordered survey dataset.
//!
//! Records are ingested once from a [`DataSource`]. Field aliasing is
//! resolved at ingestion through the declarative table on [`Field`], so the
//! filter engine, aggregator and insight generator only ever address
//! canonical fields.

mod field;

use std::collections::{BTreeMap, BTreeSet, HashMap};

pub use field::Field;

use crate::labels;
use crate::source::{DataSource, LoadError, RawRecord};

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One survey respondent's answers, keyed by canonical field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: HashMap<Field, String>,
    /// Columns that are not a known survey field, kept verbatim.
    extra: BTreeMap<String, String>,
}

impl Record {
    /// Resolve every known field of a raw record through its aliases.
    pub fn from_raw(raw: &RawRecord) -> Self {
        let mut values = HashMap::new();
        for field in Field::ALL {
            let present = raw.contains_key(field.key())
                || field.aliases().iter().any(|alias| raw.contains_key(*alias))
                || raw.keys().any(|key| field.matches_key(key));
            if present {
                let value = labels::lookup(raw, field.key(), field.aliases());
                values.insert(field, value.to_string());
            }
        }

        let extra = raw
            .iter()
            .filter(|(key, _)| Field::for_key(key).is_none())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self { values, extra }
    }

    /// Builder-style setter, mostly for constructing fixtures.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    /// The field's value, or `""` when the record lacks it.
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }

    /// Whether the record carries a non-empty value for `field`.
    pub fn has(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    /// Raw keys of the columns that are not a known survey field.
    pub fn extra_keys(&self) -> impl Iterator<Item = &str> {
        self.extra.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// The full, ordered, non-empty collection of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Wrap records into a dataset; `None` when there are none.
    pub fn from_records(records: Vec<Record>) -> Option<Self> {
        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Every unrecognised column seen across the dataset, sorted.
    pub fn extra_columns(&self) -> BTreeSet<&str> {
        self.records.iter().flat_map(|r| r.extra_keys()).collect()
    }

    /// Always `false` for a constructed dataset; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Fetch and ingest the dataset.
///
/// Fails with [`LoadError::EmptyDataset`] when the source answers with zero
/// records; transport and payload errors from the source pass through.
pub fn load(source: &dyn DataSource) -> Result<Dataset, LoadError> {
    let raw = source.fetch_records()?;
    let records = raw.iter().map(Record::from_raw).collect();
    Dataset::from_records(records).ok_or_else(|| LoadError::EmptyDataset {
        endpoint: source.describe(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CountMap, CrossTabRow, Endpoint, ReasonsAnalysis};

    struct StaticSource(Vec<RawRecord>);

    impl DataSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }
        fn fetch_records(&self) -> Result<Vec<RawRecord>, LoadError> {
            Ok(self.0.clone())
        }
        fn fetch_reasons(&self) -> Result<ReasonsAnalysis, LoadError> {
            Ok(ReasonsAnalysis::default())
        }
        fn fetch_year_wise(&self) -> Result<Vec<CrossTabRow>, LoadError> {
            Ok(Vec::new())
        }
        fn fetch_count_map(&self, _endpoint: Endpoint) -> Result<CountMap, LoadError> {
            Ok(CountMap::new())
        }
    }

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_raw_resolves_aliases() {
        let record = Record::from_raw(&raw(&[
            ("Major", "CS"),
            (" GPA range", "70 - 79"),
            ("Relationship between class attendance and GPA ", "x"),
            ("Factors  influencing attendance", "all"),
        ]));
        assert_eq!(record.get(Field::Major), "CS");
        assert_eq!(record.get(Field::GpaRange), "70 - 79");
        assert_eq!(record.get(Field::AttendanceGpaRelationship), "x");
        assert_eq!(record.get(Field::FactorsInfluencing), "all");
        assert_eq!(record.get(Field::Gender), "");
        assert!(!record.has(Field::Gender));
    }

    #[test]
    fn from_raw_keeps_unknown_columns() {
        let record = Record::from_raw(&raw(&[("Timestamp", "2025-03-01"), ("Major", "CS")]));
        assert_eq!(record.extra_keys().collect::<Vec<_>>(), vec!["Timestamp"]);
    }

    #[test]
    fn extra_columns_span_all_records() {
        let dataset = load(&StaticSource(vec![
            raw(&[("Timestamp", "2025-03-01"), ("Major", "CS")]),
            raw(&[("Email", "a@b.c"), ("Timestamp", "2025-03-02")]),
        ]))
        .unwrap();
        let columns: Vec<&str> = dataset.extra_columns().into_iter().collect();
        assert_eq!(columns, vec!["Email", "Timestamp"]);
    }

    #[test]
    fn load_rejects_empty_result() {
        let err = load(&StaticSource(Vec::new())).unwrap_err();
        assert!(matches!(err, LoadError::EmptyDataset { .. }));
    }

    #[test]
    fn load_preserves_order() {
        let source = StaticSource(vec![
            raw(&[("Major", "B")]),
            raw(&[("Major", "A")]),
            raw(&[("Major", "C")]),
        ]);
        let dataset = load(&source).unwrap();
        let majors: Vec<&str> = dataset.iter().map(|r| r.get(Field::Major)).collect();
        assert_eq!(majors, vec!["B", "A", "C"]);
    }
}
