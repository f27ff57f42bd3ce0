//! Dashboard controller.
//!
//! [`Dashboard`] owns everything a session needs: the loaded dataset, the
//! facet choices derived from it, the single [`FilterState`], the remote
//! aggregates fetched at startup, and the renderer. Every mutation runs the
//! full chain to completion: filter, aggregate, summarize, generate
//! insights, then destroy and recreate every chart.

use serde::Serialize;

use crate::aggregate::backend::BackendAggregates;
use crate::aggregate::metrics::{AggregateSettings, MetricFailure, build_charts};
use crate::aggregate::summary::SummaryCards;
use crate::config::{AggregateMode, ClasspulseConfig};
use crate::filter::{
    Facet, FacetOptions, FilterState, FilteredView, Selection, apply_filter, derive_facet_options,
};
use crate::insights::{self, Insight};
use crate::logger::{DashboardEvent, EventLog};
use crate::render::{ChartRenderer, ChartSpec};
use crate::source::{DataSource, LoadError};
use crate::store::{self, Dataset};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How a dashboard is built.
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub mode: AggregateMode,
    pub settings: AggregateSettings,
    /// Filters in effect for the first render.
    pub initial: FilterState,
}

impl DashboardOptions {
    pub fn from_config(cfg: &ClasspulseConfig) -> Self {
        Self {
            mode: cfg.aggregates.mode,
            settings: AggregateSettings::from_config(cfg),
            initial: FilterState::default(),
        }
    }

    pub fn with_filters(mut self, initial: FilterState) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_mode(mut self, mode: AggregateMode) -> Self {
        self.mode = mode;
        self
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything one recompute produced, tagged with the filter version it was
/// computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub version: u64,
    pub filters: FilterState,
    pub matched: usize,
    pub summary: SummaryCards,
    pub charts: Vec<ChartSpec>,
    pub failures: Vec<MetricFailure>,
    pub insights: Vec<Insight>,
}

impl Snapshot {
    pub fn chart(&self, id: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.id == id)
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard<R: ChartRenderer> {
    dataset: Dataset,
    options: FacetOptions,
    state: FilterState,
    /// `None` when aggregates are derived from the view on every recompute.
    remote: Option<BackendAggregates>,
    settings: AggregateSettings,
    renderer: R,
    log: EventLog,
    snapshot: Snapshot,
}

impl<R: ChartRenderer> Dashboard<R> {
    /// Load the dataset, fetch the remote aggregates, and render once.
    ///
    /// A load failure is logged and returned before any chart is created.
    /// Aggregate endpoint failures are not load failures: they surface as
    /// [`MetricFailure`]s of the metrics that need them.
    pub fn initialize(
        source: &dyn DataSource,
        options: DashboardOptions,
        renderer: R,
        log: EventLog,
    ) -> Result<Self, LoadError> {
        let dataset = match store::load(source) {
            Ok(dataset) => dataset,
            Err(e) => {
                log.record(&DashboardEvent::load_failed(
                    &source.describe(),
                    &e.to_string(),
                ));
                return Err(e);
            }
        };
        log.record(&DashboardEvent::load(&source.describe(), dataset.len()));

        let remote = (options.mode == AggregateMode::Remote && source.serves_aggregates())
            .then(|| BackendAggregates::fetch(source));

        let mut dashboard = Self {
            options: derive_facet_options(&dataset),
            dataset,
            state: options.initial,
            remote,
            settings: options.settings,
            renderer,
            log,
            snapshot: Snapshot {
                version: 0,
                filters: FilterState::default(),
                matched: 0,
                summary: SummaryCards::default(),
                charts: Vec::new(),
                failures: Vec::new(),
                insights: Vec::new(),
            },
        };
        dashboard.recompute();
        Ok(dashboard)
    }

    /// Replace one facet's selection and recompute everything.
    pub fn select(&mut self, facet: Facet, selection: Selection) -> &Snapshot {
        let value = selection.to_string();
        self.state.select(facet, selection);
        self.recompute();
        self.log.record(&DashboardEvent::select(
            facet.name(),
            &value,
            self.snapshot.matched,
            self.snapshot.version,
        ));
        &self.snapshot
    }

    /// Return every facet to "all" and recompute everything.
    pub fn reset(&mut self) -> &Snapshot {
        self.state.reset();
        self.recompute();
        self.log.record(&DashboardEvent::reset(
            self.snapshot.matched,
            self.snapshot.version,
        ));
        &self.snapshot
    }

    /// Run the full chain for the current state and hand the result to the
    /// renderer.
    pub fn recompute(&mut self) -> &Snapshot {
        let snapshot = self.compute();

        self.renderer.destroy_all();
        self.renderer.show_summary(&snapshot.summary);
        self.renderer.create_all(&snapshot.charts);
        self.renderer.show_insights(&snapshot.insights);
        self.renderer.show_failures(&snapshot.failures);

        for failure in &snapshot.failures {
            self.log.record(&DashboardEvent::metric_failed(
                failure.metric.id(),
                &failure.reason,
                snapshot.version,
            ));
        }

        self.snapshot = snapshot;
        &self.snapshot
    }

    fn compute(&self) -> Snapshot {
        let view = self.view();
        let derived;
        let aggregates = match &self.remote {
            Some(remote) => remote,
            None => {
                derived = BackendAggregates::derive(&view);
                &derived
            }
        };
        let (charts, failures) = build_charts(&view, aggregates, &self.settings);

        Snapshot {
            version: self.state.version(),
            filters: self.state.clone(),
            matched: view.len(),
            summary: SummaryCards::compute(&view),
            charts,
            failures,
            insights: insights::generate(&view),
        }
    }

    /// The records matching the current filters.
    pub fn view(&self) -> FilteredView<'_> {
        apply_filter(&self.dataset, &self.state)
    }

    /// The result of the latest recompute.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn options(&self) -> &FacetOptions {
        &self.options
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Whether aggregates are derived from the view instead of fetched.
    pub fn is_local(&self) -> bool {
        self.remote.is_none()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
