//! JSON renderer: collects one recompute's output for a browser charting
//! library.

use anyhow::Result;
use serde::Serialize;

use super::{ChartRenderer, ChartSpec};
use crate::aggregate::metrics::MetricFailure;
use crate::aggregate::summary::SummaryCards;
use crate::insights::Insight;

#[derive(Debug, Clone, Default, Serialize)]
pub struct JsonRenderer {
    summary: Option<SummaryCards>,
    charts: Vec<ChartSpec>,
    insights: Vec<Insight>,
    failures: Vec<MetricFailure>,
}

impl JsonRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ChartRenderer for JsonRenderer {
    fn destroy_all(&mut self) {
        self.charts.clear();
    }

    fn create_all(&mut self, charts: &[ChartSpec]) {
        self.charts = charts.to_vec();
    }

    fn show_summary(&mut self, summary: &SummaryCards) {
        self.summary = Some(*summary);
    }

    fn show_insights(&mut self, insights: &[Insight]) {
        self.insights = insights.to_vec();
    }

    fn show_failures(&mut self, failures: &[MetricFailure]) {
        self.failures = failures.to_vec();
    }
}
