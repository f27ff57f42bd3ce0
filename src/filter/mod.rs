//! Filter engine.
//!
//! A [`FilterState`] holds one [`Selection`] per [`Facet`]; applying it to
//! the dataset yields a [`FilteredView`], the conjunction of every facet
//! constraint, in dataset order. The view borrows records from the dataset
//! and is rebuilt on every state change.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::labels::categories::{GpaBand, StudyYear};
use crate::store::{Dataset, Field, Record};

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

/// A dimension the user can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Major,
    Year,
    GpaRange,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Major, Facet::Year, Facet::GpaRange];

    pub fn name(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Year => "year",
            Self::GpaRange => "gpaRange",
        }
    }

    /// The record field the facet constrains.
    pub fn field(self) -> Field {
        match self {
            Self::Major => Field::Major,
            Self::Year => Field::Year,
            Self::GpaRange => Field::GpaRange,
        }
    }

    /// Parse a facet name as typed by a user (`gpa` and `gpa_range` accepted).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "major" => Some(Self::Major),
            "year" => Some(Self::Year),
            "gpa" | "gparange" | "gpa_range" | "gpa-range" => Some(Self::GpaRange),
            _ => None,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The sentinel meaning "no constraint".
pub const ALL: &str = "all";

/// A facet's current selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    /// `"all"` (or an empty string) selects everything; anything else is a
    /// literal value, accepted even when no record carries it.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == ALL {
            Self::All
        } else {
            Self::Value(raw.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Value(wanted) => wanted == value,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL,
            Self::Value(v) => v,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// The current selection of every facet.
///
/// `version` increases on every mutation so a snapshot can be tied to the
/// exact state it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterState {
    version: u64,
    major: Selection,
    year: Selection,
    #[serde(rename = "gpaRange")]
    gpa_range: Selection,
}

impl FilterState {
    /// Builder for an initial state; does not bump the version.
    pub fn with(mut self, facet: Facet, selection: Selection) -> Self {
        *self.slot(facet) = selection;
        self
    }

    pub fn get(&self, facet: Facet) -> &Selection {
        match facet {
            Facet::Major => &self.major,
            Facet::Year => &self.year,
            Facet::GpaRange => &self.gpa_range,
        }
    }

    /// Replace one facet's selection.
    pub fn select(&mut self, facet: Facet, selection: Selection) {
        *self.slot(facet) = selection;
        self.version += 1;
    }

    /// Return every facet to "all".
    pub fn reset(&mut self) {
        self.major = Selection::All;
        self.year = Selection::All;
        self.gpa_range = Selection::All;
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_unfiltered(&self) -> bool {
        Facet::ALL.iter().all(|f| self.get(*f).is_all())
    }

    pub fn matches(&self, record: &Record) -> bool {
        Facet::ALL
            .iter()
            .all(|f| self.get(*f).matches(record.get(f.field())))
    }

    fn slot(&mut self, facet: Facet) -> &mut Selection {
        match facet {
            Facet::Major => &mut self.major,
            Facet::Year => &mut self.year,
            Facet::GpaRange => &mut self.gpa_range,
        }
    }
}

/// A fresh state with every facet at "all".
pub fn reset() -> FilterState {
    FilterState::default()
}

// ---------------------------------------------------------------------------
// Facet options
// ---------------------------------------------------------------------------

/// Choices offered for each facet, derived once from the full dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FacetOptions {
    pub major: Vec<String>,
    pub year: Vec<String>,
    #[serde(rename = "gpaRange")]
    pub gpa_range: Vec<String>,
}

impl FacetOptions {
    pub fn get(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Major => &self.major,
            Facet::Year => &self.year,
            Facet::GpaRange => &self.gpa_range,
        }
    }
}

/// Majors sorted lexicographically; years and GPA bands in their ordinal
/// order, restricted to values present in the data.
pub fn derive_facet_options(dataset: &Dataset) -> FacetOptions {
    let mut major: Vec<String> = dataset
        .iter()
        .map(|r| r.get(Field::Major))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    major.sort();
    major.dedup();

    FacetOptions {
        major,
        year: present_in_order(dataset, Field::Year, &StudyYear::answers()),
        gpa_range: present_in_order(dataset, Field::GpaRange, &GpaBand::answers()),
    }
}

fn present_in_order(dataset: &Dataset, field: Field, order: &[&str]) -> Vec<String> {
    order
        .iter()
        .filter(|value| dataset.iter().any(|r| r.get(field) == **value))
        .map(|value| value.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// The records satisfying a [`FilterState`], in dataset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, &'a Record>> {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'v, 'a> IntoIterator for &'v FilteredView<'a> {
    type Item = &'a Record;
    type IntoIter = std::iter::Copied<std::slice::Iter<'v, &'a Record>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter().copied()
    }
}

impl<'a> FromIterator<&'a Record> for FilteredView<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Keep the records matching every facet. Pure.
pub fn apply_filter<'a>(dataset: &'a Dataset, state: &FilterState) -> FilteredView<'a> {
    dataset.iter().filter(|r| state.matches(r)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let rows = [
            ("Physics", "Second Year", "80 - 89"),
            ("CS", "First Year", "70 - 79"),
            ("Biology", "Master 1 (M1)", "Below 60"),
            ("CS", "Second Year", "80 - 89"),
            ("", "Fifth Year", "90 - 100"),
        ];
        let records = rows
            .iter()
            .map(|(major, year, gpa)| {
                Record::default()
                    .with(Field::Major, *major)
                    .with(Field::Year, *year)
                    .with(Field::GpaRange, *gpa)
            })
            .collect();
        Dataset::from_records(records).unwrap()
    }

    #[test]
    fn facet_options_sort_majors_and_keep_ordinal_order() {
        let options = derive_facet_options(&dataset());
        assert_eq!(options.major, vec!["Biology", "CS", "Physics"]);
        assert_eq!(
            options.year,
            vec!["First Year", "Second Year", "Master 1 (M1)"]
        );
        assert_eq!(options.gpa_range, vec!["Below 60", "70 - 79", "80 - 89", "90 - 100"]);
    }

    #[test]
    fn all_facets_at_all_returns_full_dataset() {
        let data = dataset();
        let view = apply_filter(&data, &reset());
        assert_eq!(view.len(), data.len());
        assert!(view.iter().zip(data.iter()).all(|(a, b)| std::ptr::eq(a, b)));
    }

    #[test]
    fn filter_is_conjunctive_and_order_preserving() {
        let data = dataset();
        let state = reset()
            .with(Facet::Major, Selection::parse("CS"))
            .with(Facet::GpaRange, Selection::parse("80 - 89"));
        let view = apply_filter(&data, &state);
        assert_eq!(view.len(), 1);
        assert_eq!(view.records()[0].get(Field::Year), "Second Year");

        let state = reset().with(Facet::Major, Selection::parse("CS"));
        let years: Vec<&str> = apply_filter(&data, &state)
            .iter()
            .map(|r| r.get(Field::Year))
            .collect();
        assert_eq!(years, vec!["First Year", "Second Year"]);
    }

    #[test]
    fn unknown_value_yields_empty_view() {
        let data = dataset();
        let state = reset().with(Facet::Major, Selection::parse("History"));
        assert!(apply_filter(&data, &state).is_empty());
    }

    #[test]
    fn mutations_bump_version() {
        let mut state = reset();
        assert_eq!(state.version(), 0);
        state.select(Facet::Year, Selection::parse("First Year"));
        assert_eq!(state.version(), 1);
        assert!(!state.is_unfiltered());
        state.reset();
        assert_eq!(state.version(), 2);
        assert!(state.is_unfiltered());
    }

    #[test]
    fn selection_parse_recognizes_sentinel() {
        assert_eq!(Selection::parse("all"), Selection::All);
        assert_eq!(Selection::parse(""), Selection::All);
        assert_eq!(Selection::parse(" CS "), Selection::Value("CS".to_string()));
    }

    #[test]
    fn facet_names() {
        assert_eq!(Facet::from_name("gpa"), Some(Facet::GpaRange));
        assert_eq!(Facet::from_name("gpaRange"), Some(Facet::GpaRange));
        assert_eq!(Facet::from_name("Major"), Some(Facet::Major));
        assert_eq!(Facet::from_name("gender"), None);
    }

    #[test]
    fn state_serializes_with_facet_names() {
        let state = reset().with(Facet::Major, Selection::parse("CS"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["major"], "CS");
        assert_eq!(json["gpaRange"], "all");
        assert_eq!(json["version"], 0);
    }
}
