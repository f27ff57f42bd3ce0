//! Aggregator: group-and-count, ordering policies, and chart series.
//!
//! Everything here is pure. [`Counts`] is the grouping primitive; the
//! ordering helpers turn it into ordered entries, and [`metrics`] wires one
//! function per chart on top of them.

pub mod backend;
pub mod metrics;
pub mod summary;

use std::collections::HashMap;

use serde::Serialize;

use crate::labels::categories::ScaleLevel;
use crate::labels::palette::{self, Color};
use crate::source::{CountMap, CrossTabRow};
use crate::store::{Field, Record};

/// Separator between the answers of a multiple-choice question.
pub const MULTI_VALUE_SEPARATOR: char = ';';

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Occurrence counts keyed by value, in first-encountered order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
    /// Records that had no value for the grouped field.
    excluded: u64,
}

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: u64) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += n,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
    }

    pub fn exclude(&mut self) {
        self.excluded += 1;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map_or(0, |&i| self.entries[i].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
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

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn excluded(&self) -> u64 {
        self.excluded
    }

    /// Entry with the highest count; the first seen wins a tie.
    pub fn top(&self) -> Option<(&str, u64)> {
        descending(self, Some(1)).into_iter().next()
    }
}

impl From<&CountMap> for Counts {
    fn from(map: &CountMap) -> Self {
        let mut counts = Counts::new();
        for (key, count) in map.iter() {
            counts.add_n(key, count);
        }
        counts
    }
}

impl From<&Counts> for CountMap {
    fn from(counts: &Counts) -> Self {
        counts.iter().collect()
    }
}

/// Count the values of `field`. Empty values are excluded, not a category.
pub fn count_field<'a>(records: impl IntoIterator<Item = &'a Record>, field: Field) -> Counts {
    let mut counts = Counts::new();
    for record in records {
        match record.get(field) {
            "" => counts.exclude(),
            value => counts.add(value),
        }
    }
    counts
}

/// Trimmed, non-empty pieces of a multi-value answer.
pub fn split_answers(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(MULTI_VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
}

/// Count every sub-answer of a `;`-separated field.
///
/// A record whose whole value equals `sentinel` is skipped before
/// splitting; it is not counted as excluded.
pub fn count_split<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    field: Field,
    sentinel: Option<&str>,
) -> Counts {
    let mut counts = Counts::new();
    for record in records {
        let value = record.get(field).trim();
        if value.is_empty() {
            counts.exclude();
            continue;
        }
        if sentinel.is_some_and(|s| s == value) {
            continue;
        }
        for answer in split_answers(value) {
            counts.add(answer);
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Ordering policies
// ---------------------------------------------------------------------------

/// Entries by descending count, ties in first-seen order, optionally capped.
pub fn descending(counts: &Counts, cap: Option<usize>) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = counts.iter().collect();
    // sort_by is stable
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(cap) = cap {
        entries.truncate(cap);
    }
    entries
}

/// Entries in `canonical` order, keeping only canonical values present in
/// `counts`. Values outside the canonical list are dropped.
pub fn in_canonical_order<'c>(counts: &Counts, canonical: &[&'c str]) -> Vec<(&'c str, u64)> {
    canonical
        .iter()
        .filter(|value| counts.contains(value))
        .map(|value| (*value, counts.get(value)))
        .collect()
}

/// Entries whose key is a 1–5 scale level, ascending by level.
pub fn in_scale_order(counts: &Counts) -> Vec<(ScaleLevel, u64)> {
    let mut by_level: Vec<(ScaleLevel, u64)> = Vec::new();
    for (key, count) in counts.iter() {
        let Some(level) = ScaleLevel::parse(key) else {
            continue;
        };
        match by_level.iter_mut().find(|(l, _)| *l == level) {
            Some(entry) => entry.1 += count,
            None => by_level.push((level, count)),
        }
    }
    by_level.sort_by_key(|(level, _)| *level);
    by_level
}

/// Count-weighted mean of a 1–5 scale: Σ(level × count) / Σcount.
///
/// Keys that are not scale levels are ignored. `None` when nothing counts.
pub fn scale_average(counts: &Counts) -> Option<f64> {
    let (weighted, total) = in_scale_order(counts)
        .into_iter()
        .fold((0u64, 0u64), |(w, t), (level, count)| {
            (w + u64::from(level.value()) * count, t + count)
        });
    if total == 0 {
        None
    } else {
        Some(weighted as f64 / total as f64)
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// One bar / slice / point of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Display label, one element per rendered line.
    pub label: Vec<String>,
    pub value: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: vec![label.into()],
            value,
            color: None,
        }
    }

    pub fn lines(label: Vec<String>, value: u64) -> Self {
        Self {
            label,
            value,
            color: None,
        }
    }

    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Label lines joined with spaces.
    pub fn display_label(&self) -> String {
        self.label.join(" ")
    }
}

/// The ordered series of one chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSeries {
    pub points: Vec<SeriesPoint>,
    /// Records left out because the field was missing or empty.
    pub excluded: u64,
}

impl MetricSeries {
    pub fn new(points: Vec<SeriesPoint>) -> Self {
        Self {
            points,
            excluded: 0,
        }
    }

    pub fn with_excluded(mut self, excluded: u64) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(SeriesPoint::display_label).collect()
    }

    pub fn values(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Cross-tabulation
// ---------------------------------------------------------------------------

/// Rectangular outer × inner table with zero-filled cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossTab {
    pub outer: Vec<String>,
    pub inner: Vec<(String, Color)>,
    /// `cells[o][i]` is the count for `outer[o]` × `inner[i]`.
    pub cells: Vec<Vec<u64>>,
}

impl CrossTab {
    /// Flatten outer-major into |outer| × |inner| points.
    pub fn to_series(&self) -> MetricSeries {
        let points = self
            .outer
            .iter()
            .zip(&self.cells)
            .flat_map(|(outer, row)| {
                self.inner.iter().zip(row).map(move |((inner, color), value)| {
                    SeriesPoint::lines(vec![outer.clone(), inner.clone()], *value)
                        .colored(*color)
                })
            })
            .collect();
        MetricSeries::new(points)
    }

    /// Values of one inner category across every outer category.
    pub fn column(&self, inner_index: usize) -> Vec<u64> {
        self.cells
            .iter()
            .map(|row| row.get(inner_index).copied().unwrap_or(0))
            .collect()
    }
}

/// Build a cross-tab from backend rows.
///
/// Outer and inner categories are the canonical values that occur in at
/// least one row, in canonical order; every pair missing from `rows` is 0.
/// Rows naming a non-canonical value are ignored.
pub fn cross_tab(
    rows: &[CrossTabRow],
    outer_order: &[&str],
    inner_order: &[&str],
    inner_color: impl Fn(&str) -> Color,
) -> CrossTab {
    let outer: Vec<String> = outer_order
        .iter()
        .filter(|o| rows.iter().any(|r| r.year == **o))
        .map(|o| o.to_string())
        .collect();
    let inner: Vec<(String, Color)> = inner_order
        .iter()
        .filter(|i| rows.iter().any(|r| r.behavior == **i))
        .map(|i| (i.to_string(), inner_color(*i)))
        .collect();

    let cells = outer
        .iter()
        .map(|o| {
            inner
                .iter()
                .map(|(i, _)| {
                    rows.iter()
                        .filter(|r| r.year == *o && r.behavior == *i)
                        .map(|r| r.count)
                        .sum()
                })
                .collect()
        })
        .collect();

    CrossTab {
        outer,
        inner,
        cells,
    }
}

/// Position-colored points: the `i`-th entry takes `palette[i]`.
pub fn index_colored<S: Into<String>>(
    entries: impl IntoIterator<Item = (S, u64)>,
    colors: &[Color],
) -> Vec<SeriesPoint> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (label, value))| {
            SeriesPoint::new(label, value).colored(palette::indexed(colors, i))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> Counts {
        let mut c = Counts::new();
        for (k, n) in pairs {
            c.add_n(k, *n);
        }
        c
    }

    fn records(field: Field, values: &[&str]) -> Vec<Record> {
        values
            .iter()
            .map(|v| Record::default().with(field, *v))
            .collect()
    }

    #[test]
    fn count_field_excludes_empty_values() {
        let rs = records(Field::Gender, &["Male", "", "Female", "Male"]);
        let c = count_field(&rs, Field::Gender);
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![("Male", 2), ("Female", 1)]);
        assert_eq!(c.excluded(), 1);
        assert_eq!(c.total(), 3);
    }

    #[test]
    fn count_field_counts_missing_field_as_excluded() {
        let rs = vec![Record::default(), Record::default().with(Field::Major, "CS")];
        let c = count_field(&rs, Field::Major);
        assert_eq!(c.len(), 1);
        assert_eq!(c.excluded(), 1);
    }

    #[test]
    fn split_trims_and_counts_each_answer() {
        let rs = records(Field::CompensationMethods, &["A;B ; C"]);
        let c = count_split(&rs, Field::CompensationMethods, None);
        assert_eq!(
            c.iter().collect::<Vec<_>>(),
            vec![("A", 1), ("B", 1), ("C", 1)]
        );
    }

    #[test]
    fn split_drops_empty_pieces_and_sentinel() {
        let rs = records(Field::CompensationMethods, &["A;;B;", "none", "A"]);
        let c = count_split(&rs, Field::CompensationMethods, Some("none"));
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![("A", 2), ("B", 1)]);
        assert_eq!(c.excluded(), 0);
    }

    #[test]
    fn descending_is_stable_and_non_increasing() {
        let c = counts(&[("a", 2), ("b", 5), ("c", 2), ("d", 5), ("e", 1)]);
        let sorted = descending(&c, None);
        assert_eq!(
            sorted,
            vec![("b", 5), ("d", 5), ("a", 2), ("c", 2), ("e", 1)]
        );
        assert!(sorted.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn descending_caps_after_sorting() {
        let c = counts(&[("a", 1), ("b", 3), ("c", 2)]);
        assert_eq!(descending(&c, Some(2)), vec![("b", 3), ("c", 2)]);
    }

    #[test]
    fn canonical_order_drops_unexpected_values() {
        let c = counts(&[("80 - 89", 3), ("Below 60", 1), ("unknown", 9)]);
        let ordered = in_canonical_order(&c, &["Below 60", "60 - 69", "80 - 89"]);
        assert_eq!(ordered, vec![("Below 60", 1), ("80 - 89", 3)]);
    }

    #[test]
    fn scale_average_weights_by_count() {
        let c = counts(&[("1", 2), ("5", 2)]);
        assert_eq!(scale_average(&c), Some(3.0));
    }

    #[test]
    fn scale_average_ignores_non_levels_and_empty() {
        let c = counts(&[("4", 1), ("n/a", 10)]);
        assert_eq!(scale_average(&c), Some(4.0));
        assert_eq!(scale_average(&Counts::new()), None);
    }

    #[test]
    fn scale_order_merges_float_keys() {
        let c = counts(&[("3.0", 1), ("1", 2), ("3", 4)]);
        let levels: Vec<(u8, u64)> = in_scale_order(&c)
            .into_iter()
            .map(|(l, n)| (l.value(), n))
            .collect();
        assert_eq!(levels, vec![(1, 2), (3, 5)]);
    }

    #[test]
    fn cross_tab_zero_fills_rectangle() {
        let rows = vec![
            CrossTabRow {
                year: "Y2".into(),
                behavior: "B1".into(),
                count: 3,
            },
            CrossTabRow {
                year: "Y1".into(),
                behavior: "B2".into(),
                count: 4,
            },
            CrossTabRow {
                year: "Y9".into(),
                behavior: "B1".into(),
                count: 7,
            },
        ];
        let tab = cross_tab(&rows, &["Y1", "Y2", "Y3"], &["B1", "B2"], |_| palette::BLUE);
        assert_eq!(tab.outer, vec!["Y1", "Y2"]);
        assert_eq!(tab.cells, vec![vec![0, 4], vec![3, 0]]);

        let series = tab.to_series();
        assert_eq!(series.len(), tab.outer.len() * tab.inner.len());
        assert_eq!(series.values(), vec![0, 4, 3, 0]);
        assert_eq!(series.points[1].label, vec!["Y1", "B2"]);
        assert_eq!(tab.column(0), vec![0, 3]);
    }

    #[test]
    fn top_prefers_first_seen_on_tie() {
        let c = counts(&[("x", 2), ("y", 2)]);
        assert_eq!(c.top(), Some(("x", 2)));
        assert_eq!(Counts::new().top(), None);
    }
}
