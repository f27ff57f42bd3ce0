//! Rendering collaborator.
//!
//! The dashboard never draws anything itself: each recompute produces a
//! list of [`ChartSpec`]s and hands them to a [`ChartRenderer`], which owns
//! every chart it has created and replaces them wholesale.
//!
//! - [`TerminalRenderer`]: colored bar rows on stdout
//! - [`JsonRenderer`]: collects everything for a browser charting library

pub mod json;
pub mod terminal;

use serde::Serialize;

use crate::aggregate::metrics::MetricFailure;
use crate::aggregate::summary::SummaryCards;
use crate::aggregate::{CrossTab, MetricSeries};
use crate::insights::Insight;
use crate::labels::palette::Color;

pub use json::JsonRenderer;
pub use terminal::TerminalRenderer;

// ---------------------------------------------------------------------------
// Chart specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Pie,
    Doughnut,
    GroupedBar,
}

impl ChartKind {
    /// Part-of-whole charts show shares next to counts.
    pub fn is_proportional(self) -> bool {
        matches!(self, Self::Pie | Self::Doughnut)
    }
}

/// One series of values drawn over a chart's labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub values: Vec<u64>,
    /// One color per value, or a single color for the whole dataset.
    pub colors: Vec<Color>,
}

impl ChartDataset {
    /// Color of the `index`-th value.
    pub fn color_at(&self, index: usize) -> Option<Color> {
        self.colors
            .get(index)
            .or_else(|| self.colors.first())
            .copied()
    }
}

/// Everything a charting library needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    /// Category labels, each as one or more display lines.
    pub labels: Vec<Vec<String>>,
    pub datasets: Vec<ChartDataset>,
    /// Records left out because they lack the charted field.
    pub excluded: u64,
}

impl ChartSpec {
    /// A single-dataset chart from a series.
    ///
    /// Points carrying their own color keep it; otherwise `fallback` colors
    /// the whole dataset.
    pub fn from_series(
        id: &str,
        title: &str,
        kind: ChartKind,
        dataset_label: &str,
        series: &MetricSeries,
        fallback: Color,
    ) -> Self {
        let colors = if series.points.iter().all(|p| p.color.is_some()) && !series.is_empty() {
            series.points.iter().filter_map(|p| p.color).collect()
        } else {
            vec![fallback]
        };
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            labels: series.points.iter().map(|p| p.label.clone()).collect(),
            datasets: vec![ChartDataset {
                label: dataset_label.to_string(),
                values: series.values(),
                colors,
            }],
            excluded: series.excluded,
        }
    }

    /// A grouped chart: one dataset per inner category of the cross-tab.
    pub fn from_cross_tab(id: &str, title: &str, tab: &CrossTab) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind: ChartKind::GroupedBar,
            labels: tab.outer.iter().map(|o| vec![o.clone()]).collect(),
            datasets: tab
                .inner
                .iter()
                .enumerate()
                .map(|(i, (label, color))| ChartDataset {
                    label: label.clone(),
                    values: tab.column(i),
                    colors: vec![*color],
                })
                .collect(),
            excluded: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Largest value across every dataset.
    pub fn max_value(&self) -> u64 {
        self.datasets
            .iter()
            .flat_map(|d| d.values.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Renderer trait
// ---------------------------------------------------------------------------

/// Draws what a recompute produced.
///
/// A recompute calls [`destroy_all`](ChartRenderer::destroy_all), then
/// [`show_summary`](ChartRenderer::show_summary), then
/// [`create_all`](ChartRenderer::create_all), each exactly once, followed by
/// the insight and failure panels.
pub trait ChartRenderer {
    /// Drop every chart created so far.
    fn destroy_all(&mut self);

    /// Create the full set of charts for the current view.
    fn create_all(&mut self, charts: &[ChartSpec]);

    fn show_summary(&mut self, _summary: &SummaryCards) {}

    fn show_insights(&mut self, _insights: &[Insight]) {}

    fn show_failures(&mut self, _failures: &[MetricFailure]) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
