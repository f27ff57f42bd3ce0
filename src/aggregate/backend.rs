//! Backend-shaped aggregates.
//!
//! Eight charts consume count maps rather than records. In remote mode the
//! maps are fetched once from the `/api/*` endpoints; in local mode they are
//! derived from the current view with the same rules the backend applies
//! (multi-value split, label remapping before counting, top 10).

use std::collections::HashMap;

use super::{count_field, count_split, descending, split_answers, Counts};
use crate::filter::FilteredView;
use crate::labels::{self, LabelTable};
use crate::source::{CountMap, CrossTabRow, DataSource, Endpoint, ReasonsAnalysis};
use crate::store::Field;

/// Entries the backend keeps for its multi-value tallies.
pub const BACKEND_TOP_N: usize = 10;

/// Every count-map input of the chart battery.
///
/// Each slot fails independently; the error text becomes the failed
/// metric's reason.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendAggregates {
    pub reasons: Result<ReasonsAnalysis, String>,
    pub year_wise: Result<Vec<CrossTabRow>, String>,
    pub attitude: Result<CountMap, String>,
    pub effectiveness: Result<CountMap, String>,
    pub optional_frequency: Result<CountMap, String>,
    pub factors: Result<CountMap, String>,
    pub compensation: Result<CountMap, String>,
}

impl BackendAggregates {
    /// Fetch every aggregate endpoint once. A failing endpoint is recorded,
    /// not propagated.
    pub fn fetch(source: &dyn DataSource) -> Self {
        let map = |endpoint: Endpoint| {
            source
                .fetch_count_map(endpoint)
                .map_err(|e| e.to_string())
        };
        Self {
            reasons: source.fetch_reasons().map_err(|e| e.to_string()),
            year_wise: source.fetch_year_wise().map_err(|e| e.to_string()),
            attitude: map(Endpoint::Attitude),
            effectiveness: map(Endpoint::Effectiveness),
            optional_frequency: map(Endpoint::OptionalFrequency),
            factors: map(Endpoint::FactorsInfluencing),
            compensation: map(Endpoint::CompensationMethods),
        }
    }

    /// Compute the same maps from a filtered view.
    pub fn derive(view: &FilteredView<'_>) -> Self {
        Self {
            reasons: Ok(ReasonsAnalysis {
                attending: top(&count_split(view, Field::ReasonsAttending, None)),
                skipping: top(&count_split(view, Field::ReasonsSkipping, None)),
            }),
            year_wise: Ok(year_wise_rows(view)),
            attitude: Ok(value_counts(view, Field::Attitude)),
            effectiveness: Ok(value_counts(view, Field::Effectiveness)),
            optional_frequency: Ok(value_counts(view, Field::OptionalFrequency)),
            factors: Ok(top(&count_remapped(
                view,
                Field::FactorsInfluencing,
                labels::INFLUENCING_FACTORS,
            ))),
            compensation: Ok(top(&count_remapped(
                view,
                Field::CompensationMethods,
                labels::COMPENSATION_METHODS,
            ))),
        }
    }

    /// Endpoints whose fetch failed, with the reason.
    pub fn failures(&self) -> Vec<(Endpoint, &str)> {
        let slots: [(Endpoint, Option<&String>); 7] = [
            (Endpoint::ReasonsAnalysis, self.reasons.as_ref().err()),
            (Endpoint::YearWiseAnalysis, self.year_wise.as_ref().err()),
            (Endpoint::Attitude, self.attitude.as_ref().err()),
            (Endpoint::Effectiveness, self.effectiveness.as_ref().err()),
            (Endpoint::OptionalFrequency, self.optional_frequency.as_ref().err()),
            (Endpoint::FactorsInfluencing, self.factors.as_ref().err()),
            (Endpoint::CompensationMethods, self.compensation.as_ref().err()),
        ];
        slots
            .into_iter()
            .filter_map(|(endpoint, err)| err.map(|e| (endpoint, e.as_str())))
            .collect()
    }
}

/// Descending value counts of a single-answer field.
fn value_counts(view: &FilteredView<'_>, field: Field) -> CountMap {
    descending(&count_field(view, field), None)
        .into_iter()
        .collect()
}

fn top(counts: &Counts) -> CountMap {
    descending(counts, Some(BACKEND_TOP_N))
        .into_iter()
        .collect()
}

/// Split a multi-value field and remap each answer before counting, so
/// answers sharing a display label are tallied together.
fn count_remapped(view: &FilteredView<'_>, field: Field, table: LabelTable) -> Counts {
    let mut counts = Counts::new();
    for record in view {
        let value = record.get(field);
        if value.trim().is_empty() {
            counts.exclude();
            continue;
        }
        for answer in split_answers(value) {
            counts.add(labels::remap(table, answer));
        }
    }
    counts
}

/// Count (year, behavior) pairs; records missing either are skipped.
fn year_wise_rows(view: &FilteredView<'_>) -> Vec<CrossTabRow> {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut counts: HashMap<(&str, &str), u64> = HashMap::new();
    for record in view {
        let pair = (record.get(Field::Year), record.get(Field::AttendanceBehavior));
        if pair.0.is_empty() || pair.1.is_empty() {
            continue;
        }
        let count = counts.entry(pair).or_insert(0);
        if *count == 0 {
            order.push(pair);
        }
        *count += 1;
    }
    order
        .into_iter()
        .map(|(year, behavior)| CrossTabRow {
            year: year.to_string(),
            behavior: behavior.to_string(),
            count: counts[&(year, behavior)],
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
