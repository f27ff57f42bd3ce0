//! Terminal renderer: each chart as rows of truecolor bars.

use colored::Colorize;

use super::{ChartKind, ChartRenderer, ChartSpec};
use crate::aggregate::metrics::MetricFailure;
use crate::aggregate::summary::{SummaryCards, percent};
use crate::insights::Insight;
use crate::labels::palette::Color;

const LABEL_WIDTH: usize = 32;
const BAR_WIDTH: usize = 30;

/// Prints charts to stdout as they are created and keeps them until the
/// next [`destroy_all`](ChartRenderer::destroy_all).
#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    charts: Vec<ChartSpec>,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self { charts: Vec::new() }
    }

    /// Charts currently on screen.
    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    fn print_chart(&self, spec: &ChartSpec) {
        println!("{}", spec.title.bold().cyan());
        if spec.is_empty() {
            println!("  {}", "no data".dimmed());
            println!();
            return;
        }
        for row in chart_rows(spec, BAR_WIDTH) {
            let bar = "█".repeat(row.bar_len);
            let bar = bar.truecolor(row.color.r, row.color.g, row.color.b);
            let share = row
                .share
                .map(|pct| format!(" ({pct}%)"))
                .unwrap_or_default();
            println!(
                "  {:<width$} {} {}{}",
                row.label,
                bar,
                row.value,
                share.dimmed(),
                width = LABEL_WIDTH
            );
        }
        if spec.excluded > 0 {
            println!(
                "  {}",
                format!("{} records without an answer", spec.excluded).dimmed()
            );
        }
        println!();
    }
}

impl ChartRenderer for TerminalRenderer {
    fn destroy_all(&mut self) {
        self.charts.clear();
    }

    fn create_all(&mut self, charts: &[ChartSpec]) {
        self.charts = charts.to_vec();
        for spec in &self.charts {
            self.print_chart(spec);
        }
    }

    fn show_summary(&mut self, summary: &SummaryCards) {
        println!("{}", "Survey Overview".bold().cyan());
        println!("{}", "=".repeat(60));
        println!("  {} {}", "Total students:  ".bold(), summary.total_students);
        println!("  {} {}", "Majors:          ".bold(), summary.total_majors);
        println!(
            "  {} {}%",
            "High attendance: ".bold(),
            summary.high_attendance_pct
        );
        println!("  {} {}%", "GPA 70+:         ".bold(), summary.high_gpa_pct);
        println!();
    }

    fn show_insights(&mut self, insights: &[Insight]) {
        println!("{}", "Key Insights".bold().cyan());
        println!("{}", "=".repeat(60));
        for insight in insights {
            println!("  {}", insight.title.bold());
            println!("    {}", insight.text);
        }
        println!();
    }

    fn show_failures(&mut self, failures: &[MetricFailure]) {
        for failure in failures {
            println!(
                "  {} {:<25} {}",
                "✗".red().bold(),
                failure.metric.title(),
                failure.reason.dimmed()
            );
        }
        if !failures.is_empty() {
            println!();
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// One printed bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarRow {
    pub label: String,
    pub value: u64,
    pub bar_len: usize,
    pub color: Color,
    /// Share of the dataset total, for pie and doughnut charts.
    pub share: Option<u64>,
}

/// Lay a chart out as bar rows scaled to `bar_width`.
///
/// Grouped charts get one row per (category, dataset) pair, labelled
/// `category / dataset`.
pub fn chart_rows(spec: &ChartSpec, bar_width: usize) -> Vec<BarRow> {
    let max = spec.max_value();
    let grouped = spec.kind == ChartKind::GroupedBar;
    let mut rows = Vec::new();

    for (i, label) in spec.labels.iter().enumerate() {
        let label = label.join(" ");
        for dataset in &spec.datasets {
            let value = dataset.values.get(i).copied().unwrap_or(0);
            let total: u64 = dataset.values.iter().sum();
            let label = if grouped {
                format!("{label} / {}", dataset.label)
            } else {
                label.clone()
            };
            rows.push(BarRow {
                label: truncate(&label, LABEL_WIDTH),
                value,
                bar_len: bar_len(value, max, bar_width),
                color: dataset.color_at(i).unwrap_or(crate::labels::palette::NEUTRAL),
                share: spec
                    .kind
                    .is_proportional()
                    .then(|| percent(value as usize, total as usize)),
            });
        }
    }
    rows
}

/// Bar length for `value` against the chart maximum. Any non-zero value
/// gets at least one cell.
fn bar_len(value: u64, max: u64, width: usize) -> usize {
    if value == 0 || max == 0 {
        return 0;
    }
    let scaled = (value as f64 / max as f64 * width as f64).round() as usize;
    scaled.clamp(1, width)
}

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::palette;
    use crate::render::ChartDataset;

    fn spec(kind: ChartKind, labels: &[&str], values: Vec<u64>) -> ChartSpec {
        ChartSpec {
            id: "t".to_string(),
            title: "T".to_string(),
            kind,
            labels: labels.iter().map(|l| vec![l.to_string()]).collect(),
            datasets: vec![ChartDataset {
                label: "Students".to_string(),
                values,
                colors: vec![palette::BLUE],
            }],
            excluded: 0,
        }
    }

    #[test]
    fn test_bar_len_scales_to_max() {
        assert_eq!(bar_len(10, 10, 30), 30);
        assert_eq!(bar_len(5, 10, 30), 15);
        assert_eq!(bar_len(1, 1000, 30), 1);
        assert_eq!(bar_len(0, 10, 30), 0);
        assert_eq!(bar_len(3, 0, 30), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
    }

    #[test]
    fn rows_follow_label_order() {
        let rows = chart_rows(&spec(ChartKind::Bar, &["a", "b"], vec![4, 2]), 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "a");
        assert_eq!(rows[0].bar_len, 10);
        assert_eq!(rows[1].bar_len, 5);
        assert_eq!(rows[1].share, None);
    }

    #[test]
    fn pie_rows_carry_shares() {
        let rows = chart_rows(&spec(ChartKind::Pie, &["a", "b"], vec![3, 1]), 10);
        assert_eq!(rows[0].share, Some(75));
        assert_eq!(rows[1].share, Some(25));
    }

    #[test]
    fn grouped_rows_name_both_axes() {
        let mut grouped = spec(ChartKind::GroupedBar, &["First Year"], vec![2]);
        grouped.datasets.push(ChartDataset {
            label: "Few".to_string(),
            values: vec![1],
            colors: vec![palette::RED],
        });
        let rows = chart_rows(&grouped, 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "First Year / Students");
        assert_eq!(rows[1].label, "First Year / Few");
        assert_eq!(rows[1].color, palette::RED);
    }

    #[test]
    fn destroy_all_drops_charts() {
        let mut renderer = TerminalRenderer::new();
        renderer.create_all(&[spec(ChartKind::Bar, &["a"], vec![1])]);
        assert_eq!(renderer.charts().len(), 1);
        renderer.destroy_all();
        assert!(renderer.charts().is_empty());
    }
}
