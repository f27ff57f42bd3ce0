//! The dashboard's chart battery: one aggregation per metric.
//!
//! Six metrics are computed from the filtered view directly; the other
//! eight read the backend-shaped count maps in [`BackendAggregates`]. Each
//! chart is built independently so a missing aggregate fails only its own
//! metric.

use std::fmt;

use serde::{Serialize, Serializer};

use super::backend::BackendAggregates;
use super::{
    Counts, CrossTab, MetricSeries, SeriesPoint, count_field, cross_tab, descending,
    in_canonical_order, in_scale_order, index_colored,
};
use crate::filter::FilteredView;
use crate::labels::categories::{AttendanceBehavior, Effectiveness, GpaBand, StudyYear};
use crate::labels::palette::{self, Color};
use crate::labels::{self, LabelTable};
use crate::render::{ChartKind, ChartSpec};
use crate::source::{CountMap, CrossTabRow};
use crate::store::Field;

/// Dataset label used by single-series charts.
const STUDENTS: &str = "Number of Students";
const FREQUENCY: &str = "Frequency";

// ---------------------------------------------------------------------------
// Metric identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Attendance,
    Gpa,
    Major,
    Gender,
    AttendanceGpa,
    AttendingReasons,
    SkippingReasons,
    LearningMethods,
    YearWise,
    Attitude,
    Effectiveness,
    OptionalFrequency,
    Factors,
    Compensation,
}

impl Metric {
    /// Dashboard order.
    pub const ALL: [Metric; 14] = [
        Metric::Attendance,
        Metric::Gpa,
        Metric::Major,
        Metric::Gender,
        Metric::AttendanceGpa,
        Metric::AttendingReasons,
        Metric::SkippingReasons,
        Metric::LearningMethods,
        Metric::YearWise,
        Metric::Attitude,
        Metric::Effectiveness,
        Metric::OptionalFrequency,
        Metric::Factors,
        Metric::Compensation,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Attendance => "attendance",
            Self::Gpa => "gpa",
            Self::Major => "major",
            Self::Gender => "gender",
            Self::AttendanceGpa => "attendance_gpa",
            Self::AttendingReasons => "attending_reasons",
            Self::SkippingReasons => "skipping_reasons",
            Self::LearningMethods => "learning_methods",
            Self::YearWise => "year_wise",
            Self::Attitude => "attitude",
            Self::Effectiveness => "effectiveness",
            Self::OptionalFrequency => "optional_frequency",
            Self::Factors => "factors",
            Self::Compensation => "compensation",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Attendance => "Class Attendance Behavior",
            Self::Gpa => "GPA Distribution",
            Self::Major => "Students by Major",
            Self::Gender => "Gender Distribution",
            Self::AttendanceGpa => "Attendance vs GPA Relationship",
            Self::AttendingReasons => "Reasons for Attending Classes",
            Self::SkippingReasons => "Reasons for Skipping Classes",
            Self::LearningMethods => "Most Effective Learning Methods",
            Self::YearWise => "Attendance by Year of Study",
            Self::Attitude => "Attitude Toward Attending Classes",
            Self::Effectiveness => "Effectiveness of Alternative Methods",
            Self::OptionalFrequency => "Frequency of Optional Attendance",
            Self::Factors => "Factors Influencing Attendance",
            Self::Compensation => "Ways of Compensating for Missed Content",
        }
    }

    pub fn kind(self) -> ChartKind {
        match self {
            Self::Attendance
            | Self::AttendingReasons
            | Self::SkippingReasons
            | Self::Effectiveness
            | Self::Factors
            | Self::Compensation => ChartKind::HorizontalBar,
            Self::Gpa | Self::AttendanceGpa | Self::LearningMethods => ChartKind::Bar,
            Self::Major => ChartKind::Doughnut,
            Self::Gender => ChartKind::Pie,
            Self::YearWise => ChartKind::GroupedBar,
            Self::Attitude | Self::OptionalFrequency => ChartKind::Line,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

/// A metric that could not be computed; the rest of the dashboard renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricFailure {
    pub metric: Metric,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Label and cap parameters for the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateSettings {
    /// Entries kept by the capped descending charts.
    pub top_n: usize,
    /// Line width for wrapped attendance labels.
    pub wrap_width: usize,
    pub skipping_max: usize,
    pub factors_max: usize,
    pub compensation_max: usize,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self {
            top_n: 8,
            wrap_width: 25,
            skipping_max: 35,
            factors_max: 40,
            compensation_max: 35,
        }
    }
}

impl AggregateSettings {
    pub fn from_config(cfg: &crate::config::schema::ClasspulseConfig) -> Self {
        Self {
            top_n: cfg.aggregates.top_n,
            wrap_width: cfg.labels.wrap_width,
            skipping_max: cfg.labels.skipping_max,
            factors_max: cfg.labels.factors_max,
            compensation_max: cfg.labels.compensation_max,
        }
    }
}

// ---------------------------------------------------------------------------
// View-based metrics
// ---------------------------------------------------------------------------

/// Attendance behaviors by descending count, semantically colored, wrapped.
pub fn attendance(view: &FilteredView<'_>, wrap_width: usize) -> MetricSeries {
    let counts = count_field(view, Field::AttendanceBehavior);
    let points = descending(&counts, None)
        .into_iter()
        .map(|(answer, n)| {
            SeriesPoint::lines(labels::wrap(answer, wrap_width), n)
                .colored(AttendanceBehavior::color_of(answer))
        })
        .collect();
    MetricSeries::new(points).with_excluded(counts.excluded())
}

/// GPA bands low → high.
pub fn gpa(view: &FilteredView<'_>) -> MetricSeries {
    let counts = count_field(view, Field::GpaRange);
    let ordered = in_canonical_order(&counts, &GpaBand::answers());
    MetricSeries::new(index_colored(ordered, &palette::RAMP)).with_excluded(counts.excluded())
}

/// Majors in first-seen order.
pub fn major(view: &FilteredView<'_>) -> MetricSeries {
    let counts = count_field(view, Field::Major);
    MetricSeries::new(index_colored(counts.iter(), &palette::RAMP))
        .with_excluded(counts.excluded())
}

/// Genders in first-seen order; male blue, everything else red.
pub fn gender(view: &FilteredView<'_>) -> MetricSeries {
    let counts = count_field(view, Field::Gender);
    let points = counts
        .iter()
        .map(|(gender, n)| {
            let color = if gender.eq_ignore_ascii_case("male") {
                palette::BLUE
            } else {
                palette::RED
            };
            SeriesPoint::new(gender, n).colored(color)
        })
        .collect();
    MetricSeries::new(points).with_excluded(counts.excluded())
}

/// Perceived attendance/GPA relationship in canonical answer order.
pub fn attendance_gpa(view: &FilteredView<'_>) -> MetricSeries {
    remapped_in_order(
        &count_field(view, Field::AttendanceGpaRelationship),
        labels::ATTENDANCE_GPA_RELATIONSHIP,
    )
}

/// Preferred learning methods in canonical answer order.
pub fn learning_methods(view: &FilteredView<'_>) -> MetricSeries {
    remapped_in_order(
        &count_field(view, Field::LearningMethod),
        labels::LEARNING_METHODS,
    )
}

fn remapped_in_order(counts: &Counts, table: LabelTable) -> MetricSeries {
    let points = in_canonical_order(counts, &labels::canonical_answers(table))
        .into_iter()
        .map(|(answer, n)| SeriesPoint::new(labels::remap(table, answer), n))
        .collect();
    MetricSeries::new(points).with_excluded(counts.excluded())
}

// ---------------------------------------------------------------------------
// Count-map metrics
// ---------------------------------------------------------------------------

/// Top attending reasons, remapped.
pub fn attending_reasons(map: &CountMap, top_n: usize) -> MetricSeries {
    let counts = Counts::from(map);
    let points = descending(&counts, Some(top_n))
        .into_iter()
        .map(|(reason, n)| SeriesPoint::new(labels::remap(labels::ATTENDING_REASONS, reason), n))
        .collect();
    MetricSeries::new(points)
}

/// Top skipping reasons, without the "I attend them all" non-reason.
pub fn skipping_reasons(map: &CountMap, top_n: usize, max_chars: usize) -> MetricSeries {
    let mut counts = Counts::new();
    for (reason, n) in map.iter().filter(|(reason, _)| !is_attend_all(reason)) {
        counts.add_n(reason, n);
    }
    let points = descending(&counts, Some(top_n))
        .into_iter()
        .map(|(reason, n)| {
            let label = labels::remap(labels::SKIPPING_REASONS, reason);
            SeriesPoint::new(labels::shorten(label, max_chars), n)
        })
        .collect();
    MetricSeries::new(points)
}

fn is_attend_all(reason: &str) -> bool {
    let reason = reason.to_lowercase();
    reason.contains("attend them all") || reason.contains("attend all")
}

/// Year × attendance-behavior table, zero-filled.
pub fn year_wise(rows: &[CrossTabRow]) -> CrossTab {
    cross_tab(
        rows,
        &StudyYear::answers(),
        &AttendanceBehavior::ORDER.map(AttendanceBehavior::answer),
        AttendanceBehavior::color_of,
    )
}

/// Attitude levels 1 → 5 with their names.
pub fn attitude(map: &CountMap) -> MetricSeries {
    let points = in_scale_order(&Counts::from(map))
        .into_iter()
        .map(|(level, n)| SeriesPoint::new(level.attitude_label(), n))
        .collect();
    MetricSeries::new(points)
}

/// More → Equally → Less effective.
pub fn effectiveness(map: &CountMap) -> MetricSeries {
    let counts = Counts::from(map);
    let order = Effectiveness::ORDER.map(Effectiveness::answer);
    MetricSeries::new(index_colored(
        in_canonical_order(&counts, &order),
        &palette::EFFECTIVENESS,
    ))
}

/// Optional-attendance levels 1 → 5 with their names.
pub fn optional_frequency(map: &CountMap) -> MetricSeries {
    let points = in_scale_order(&Counts::from(map))
        .into_iter()
        .map(|(level, n)| SeriesPoint::new(level.frequency_label(), n))
        .collect();
    MetricSeries::new(points)
}

/// Top influencing factors, shortened.
pub fn factors(map: &CountMap, top_n: usize, max_chars: usize) -> MetricSeries {
    top_shortened(map, top_n, max_chars)
}

/// Top compensation methods, shortened.
pub fn compensation(map: &CountMap, top_n: usize, max_chars: usize) -> MetricSeries {
    top_shortened(map, top_n, max_chars)
}

fn top_shortened(map: &CountMap, top_n: usize, max_chars: usize) -> MetricSeries {
    let counts = Counts::from(map);
    let points = descending(&counts, Some(top_n))
        .into_iter()
        .map(|(label, n)| SeriesPoint::new(labels::shorten(label, max_chars), n))
        .collect();
    MetricSeries::new(points)
}

// ---------------------------------------------------------------------------
// Chart assembly
// ---------------------------------------------------------------------------

/// Build one metric's chart.
pub fn chart_for(
    metric: Metric,
    view: &FilteredView<'_>,
    aggregates: &BackendAggregates,
    settings: &AggregateSettings,
) -> Result<ChartSpec, MetricFailure> {
    let fail = |reason: &String| MetricFailure {
        metric,
        reason: reason.clone(),
    };
    let chart = |series: MetricSeries, dataset: &str, fallback: Color| {
        ChartSpec::from_series(
            metric.id(),
            metric.title(),
            metric.kind(),
            dataset,
            &series,
            fallback,
        )
    };

    let spec = match metric {
        Metric::Attendance => chart(
            attendance(view, settings.wrap_width),
            STUDENTS,
            palette::NEUTRAL,
        ),
        Metric::Gpa => chart(gpa(view), STUDENTS, palette::BLUE),
        Metric::Major => chart(major(view), STUDENTS, palette::BLUE),
        Metric::Gender => chart(gender(view), STUDENTS, palette::RED),
        Metric::AttendanceGpa => chart(attendance_gpa(view), STUDENTS, palette::BLUE),
        Metric::LearningMethods => chart(learning_methods(view), STUDENTS, palette::PURPLE),
        Metric::AttendingReasons => {
            let reasons = aggregates.reasons.as_ref().map_err(fail)?;
            chart(
                attending_reasons(&reasons.attending, settings.top_n),
                FREQUENCY,
                palette::PURPLE,
            )
        }
        Metric::SkippingReasons => {
            let reasons = aggregates.reasons.as_ref().map_err(fail)?;
            chart(
                skipping_reasons(&reasons.skipping, settings.top_n, settings.skipping_max),
                FREQUENCY,
                palette::RED,
            )
        }
        Metric::YearWise => {
            let rows = aggregates.year_wise.as_ref().map_err(fail)?;
            ChartSpec::from_cross_tab(metric.id(), metric.title(), &year_wise(rows))
        }
        Metric::Attitude => {
            let map = aggregates.attitude.as_ref().map_err(fail)?;
            chart(attitude(map), STUDENTS, palette::INDIGO)
        }
        Metric::Effectiveness => {
            let map = aggregates.effectiveness.as_ref().map_err(fail)?;
            chart(effectiveness(map), STUDENTS, palette::PURPLE)
        }
        Metric::OptionalFrequency => {
            let map = aggregates.optional_frequency.as_ref().map_err(fail)?;
            chart(optional_frequency(map), STUDENTS, palette::INDIGO)
        }
        Metric::Factors => {
            let map = aggregates.factors.as_ref().map_err(fail)?;
            chart(
                factors(map, settings.top_n, settings.factors_max),
                FREQUENCY,
                palette::PURPLE,
            )
        }
        Metric::Compensation => {
            let map = aggregates.compensation.as_ref().map_err(fail)?;
            chart(
                compensation(map, settings.top_n, settings.compensation_max),
                FREQUENCY,
                palette::PURPLE,
            )
        }
    };
    Ok(spec)
}

/// Build every chart, collecting per-metric failures alongside.
pub fn build_charts(
    view: &FilteredView<'_>,
    aggregates: &BackendAggregates,
    settings: &AggregateSettings,
) -> (Vec<ChartSpec>, Vec<MetricFailure>) {
    let mut charts = Vec::with_capacity(Metric::ALL.len());
    let mut failures = Vec::new();
    for metric in Metric::ALL {
        match chart_for(metric, view, aggregates, settings) {
            Ok(spec) => charts.push(spec),
            Err(failure) => failures.push(failure),
        }
    }
    (charts, failures)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Record;

    fn view_of(records: &[Record]) -> FilteredView<'_> {
        records.iter().collect()
    }

    fn map(pairs: &[(&str, u64)]) -> CountMap {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn attendance_sorts_descending_with_semantic_colors() {
        let records: Vec<Record> = [
            "I attend most classes",
            "I rarely or never attend classes",
            "I attend most classes",
            "",
        ]
        .iter()
        .map(|b| Record::default().with(Field::AttendanceBehavior, *b))
        .collect();
        let series = attendance(&view_of(&records), 25);
        assert_eq!(series.values(), vec![2, 1]);
        assert_eq!(series.points[0].color, Some(palette::BLUE));
        assert_eq!(series.points[1].color, Some(palette::RED));
        assert_eq!(series.points[1].label, vec!["I rarely or never attend", "classes"]);
        assert_eq!(series.excluded, 1);
    }

    #[test]
    fn gpa_follows_band_order_and_drops_unknown() {
        let records: Vec<Record> = ["90 - 100", "Below 60", "4.0", "90 - 100"]
            .iter()
            .map(|g| Record::default().with(Field::GpaRange, *g))
            .collect();
        let series = gpa(&view_of(&records));
        assert_eq!(series.labels(), vec!["Below 60", "90 - 100"]);
        assert_eq!(series.values(), vec![1, 2]);
    }

    #[test]
    fn gender_colors_male_blue_else_red() {
        let records: Vec<Record> = ["Female", "male", "Other"]
            .iter()
            .map(|g| Record::default().with(Field::Gender, *g))
            .collect();
        let series = gender(&view_of(&records));
        let colors: Vec<_> = series.points.iter().map(|p| p.color).collect();
        assert_eq!(
            colors,
            vec![Some(palette::RED), Some(palette::BLUE), Some(palette::RED)]
        );
    }

    #[test]
    fn relationship_is_remapped_in_canonical_order() {
        let records: Vec<Record> = [
            "The relationship varies depending on the course",
            "When I attend classes more frequently, my academic performance tends to be higher",
            "Something unexpected",
        ]
        .iter()
        .map(|r| Record::default().with(Field::AttendanceGpaRelationship, *r))
        .collect();
        let series = attendance_gpa(&view_of(&records));
        assert_eq!(
            series.labels(),
            vec!["More attend -> higher GPA", "Effect depends on course"]
        );
    }

    #[test]
    fn skipping_reasons_drop_attend_all_and_shorten() {
        let reasons = map(&[
            ("I attend them all", 40),
            ("Work-related commitments", 3),
            ("A very long reason that nobody has bothered to remap at all", 5),
        ]);
        let series = skipping_reasons(&reasons, 8, 10);
        assert_eq!(series.labels(), vec!["A very lon...", "Work commi..."]);
        assert_eq!(series.values(), vec![5, 3]);
    }

    #[test]
    fn attending_reasons_cap_at_top_n() {
        let reasons: CountMap = (0..12u64).map(|i| (format!("r{i}"), i)).collect();
        let series = attending_reasons(&reasons, 8);
        assert_eq!(series.len(), 8);
        assert_eq!(series.values()[0], 11);
    }

    #[test]
    fn scale_metrics_order_levels_ascending() {
        let series = attitude(&map(&[("5", 3), ("1", 2), ("3", 1)]));
        assert_eq!(series.labels(), vec!["Very negative", "Neutral", "Very positive"]);
        let series = optional_frequency(&map(&[("2", 1), ("4", 6)]));
        assert_eq!(series.labels(), vec!["Rarely", "Often"]);
    }

    #[test]
    fn effectiveness_uses_fixed_order_and_palette() {
        let series = effectiveness(&map(&[("Less effective", 4), ("More effective", 1)]));
        assert_eq!(series.labels(), vec!["More effective", "Less effective"]);
        assert_eq!(series.points[0].color, Some(palette::PURPLE));
        assert_eq!(series.points[1].color, Some(palette::YELLOW));
    }

    #[test]
    fn failed_aggregate_fails_only_its_metric() {
        let records = vec![Record::default().with(Field::Major, "CS")];
        let mut aggregates = BackendAggregates::derive(&view_of(&records));
        aggregates.attitude = Err("HTTP error status 500".to_string());

        let (charts, failures) =
            build_charts(&view_of(&records), &aggregates, &AggregateSettings::default());
        assert_eq!(charts.len(), Metric::ALL.len() - 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].metric, Metric::Attitude);
        assert!(charts.iter().all(|c| c.id != "attitude"));
    }

    #[test]
    fn reasons_failure_fails_both_reason_charts() {
        let records = vec![Record::default()];
        let mut aggregates = BackendAggregates::derive(&view_of(&records));
        aggregates.reasons = Err("down".to_string());
        let (_, failures) =
            build_charts(&view_of(&records), &aggregates, &AggregateSettings::default());
        let failed: Vec<Metric> = failures.iter().map(|f| f.metric).collect();
        assert_eq!(
            failed,
            vec![Metric::AttendingReasons, Metric::SkippingReasons]
        );
    }

    #[test]
    fn metric_ids_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_id(metric.id()), Some(metric));
        }
    }
}
