//! CLI command implementations for classpulse.
//!
//! Provides subcommand handlers for:
//! - `classpulse dashboard`: summary cards, every chart, and the insights
//! - `classpulse facets`: filter choices derived from the dataset
//! - `classpulse insights`: the insight battery for a filtered view
//! - `classpulse explore`: interactive facet selection on stdin
//! - `classpulse health`: config files, backend and aggregate endpoints, event log
//! - `classpulse config show|init|set|reset`: configuration management

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::aggregate::backend::BackendAggregates;
use crate::config::{self, AggregateMode, ClasspulseConfig};
use crate::dashboard::{Dashboard, DashboardOptions};
use crate::filter::{Facet, FilterState, Selection, derive_facet_options};
use crate::logger::EventLog;
use crate::render::{ChartRenderer, JsonRenderer, TerminalRenderer};
use crate::source::{DataSource, FileSource, HttpSource, LoadError};
use crate::store;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Where to read the survey from. `file` wins over `url`; with neither the
/// configured backend is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceChoice<'a> {
    pub url: Option<&'a str>,
    pub file: Option<&'a Path>,
}

/// Facet selections given on the command line.
pub fn initial_filters(major: Option<&str>, year: Option<&str>, gpa: Option<&str>) -> FilterState {
    let mut state = FilterState::default();
    for (facet, value) in [
        (Facet::Major, major),
        (Facet::Year, year),
        (Facet::GpaRange, gpa),
    ] {
        if let Some(value) = value {
            state = state.with(facet, Selection::parse(value));
        }
    }
    state
}

fn open_source(choice: SourceChoice<'_>, cfg: &ClasspulseConfig) -> Box<dyn DataSource> {
    if let Some(path) = choice.file {
        return Box::new(FileSource::new(path));
    }
    match choice.url {
        Some(url) => Box::new(HttpSource::new(
            url,
            Duration::from_millis(cfg.source.timeout_ms),
        )),
        None => Box::new(HttpSource::from_config(&cfg.source)),
    }
}

fn start<R: ChartRenderer>(
    source: &dyn DataSource,
    options: DashboardOptions,
    renderer: R,
    cfg: &ClasspulseConfig,
) -> Result<Dashboard<R>> {
    match Dashboard::initialize(source, options, renderer, EventLog::from_config(&cfg.logging)) {
        Ok(dashboard) => Ok(dashboard),
        Err(e) => {
            print_load_error(&e);
            Err(e.into())
        }
    }
}

fn print_load_error(error: &LoadError) {
    eprintln!("{}", "Failed to load dashboard data".bold().red());
    eprintln!("{}", "=".repeat(60).red());
    let hint = match error {
        LoadError::SourceUnavailable { .. } => {
            "Is the backend running? Check `classpulse health` or pass --file."
        }
        LoadError::EmptyDataset { .. } => "The source answered with zero records.",
        LoadError::MalformedPayload { .. } => "Expected a JSON array of flat survey records.",
    };
    eprintln!("  {}", hint.dimmed());
    eprintln!();
}

// ---------------------------------------------------------------------------
// classpulse dashboard
// ---------------------------------------------------------------------------

/// Render the full dashboard once for the given filters.
pub fn run_dashboard(
    choice: SourceChoice<'_>,
    filters: FilterState,
    local: bool,
    format: OutputFormat,
) -> Result<()> {
    let cfg = config::load();
    let source = open_source(choice, &cfg);
    let mut options = DashboardOptions::from_config(&cfg).with_filters(filters);
    if local {
        options = options.with_mode(AggregateMode::Local);
    }

    match format {
        OutputFormat::Json => {
            let dashboard = start(source.as_ref(), options, JsonRenderer::new(), &cfg)?;
            println!("{}", dashboard.renderer().to_json()?);
        }
        OutputFormat::Table => {
            println!("{}", "classpulse Dashboard".bold().cyan());
            println!("  {} {}", "Source: ".bold(), source.describe());
            println!("  {} {}", "Filters:".bold(), describe_filters(&options.initial));
            println!();
            start(source.as_ref(), options, TerminalRenderer::new(), &cfg)?;
        }
    }
    Ok(())
}

fn describe_filters(state: &FilterState) -> String {
    Facet::ALL
        .iter()
        .map(|facet| format!("{facet}={}", state.get(*facet)))
        .collect::<Vec<_>>()
        .join("  ")
}

// ---------------------------------------------------------------------------
// classpulse facets
// ---------------------------------------------------------------------------

/// List the choices each facet offers.
pub fn run_facets(choice: SourceChoice<'_>, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let source = open_source(choice, &cfg);
    let dataset = match store::load(source.as_ref()) {
        Ok(dataset) => dataset,
        Err(e) => {
            print_load_error(&e);
            return Err(e.into());
        }
    };
    let options = derive_facet_options(&dataset);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&options)?),
        OutputFormat::Table => {
            println!("{}", "Filter Choices".bold().cyan());
            println!("{}", "=".repeat(60));
            println!("  {} {}", "Records:".bold(), dataset.len());
            let extra = dataset.extra_columns();
            if !extra.is_empty() {
                let names: Vec<&str> = extra.into_iter().collect();
                println!("  {} {}", "Other columns:".bold(), names.join(", ").dimmed());
            }
            for facet in Facet::ALL {
                println!();
                println!("  {}", facet.name().bold());
                println!("    {}", crate::filter::ALL.dimmed());
                for value in options.get(facet) {
                    println!("    {value}");
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// classpulse insights
// ---------------------------------------------------------------------------

/// Print the insight battery for a filtered view.
pub fn run_insights(choice: SourceChoice<'_>, filters: FilterState) -> Result<()> {
    let cfg = config::load();
    let source = open_source(choice, &cfg);
    let options = DashboardOptions::from_config(&cfg).with_filters(filters);
    let dashboard = start(source.as_ref(), options, JsonRenderer::new(), &cfg)?;
    let snapshot = dashboard.snapshot();

    println!("{}", "Key Insights".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {} {} of {} students",
        "Matched:".bold(),
        snapshot.matched,
        dashboard.dataset().len()
    );
    println!();
    for insight in &snapshot.insights {
        println!("  {}", insight.title.bold());
        println!("    {}", insight.text);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// classpulse explore
// ---------------------------------------------------------------------------

/// One line of input to the explore loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreCommand {
    Select(Facet, Selection),
    Reset,
    Facets,
    Help,
    Quit,
}

/// Parse an explore command such as `major Computer Science` or `reset`.
pub fn parse_command(line: &str) -> Result<ExploreCommand, String> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match head.to_ascii_lowercase().as_str() {
        "" | "help" | "?" => Ok(ExploreCommand::Help),
        "reset" => Ok(ExploreCommand::Reset),
        "facets" => Ok(ExploreCommand::Facets),
        "quit" | "exit" | "q" => Ok(ExploreCommand::Quit),
        name => match Facet::from_name(name) {
            Some(facet) => Ok(ExploreCommand::Select(facet, Selection::parse(rest.trim()))),
            None => Err(format!("unknown command: {head}")),
        },
    }
}

/// Interactive loop: every facet change re-renders the dashboard.
pub fn run_explore(choice: SourceChoice<'_>) -> Result<()> {
    let cfg = config::load();
    let source = open_source(choice, &cfg);
    let options = DashboardOptions::from_config(&cfg);
    let mut dashboard = start(source.as_ref(), options, TerminalRenderer::new(), &cfg)?;

    print_explore_help();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", ">".bold().cyan());
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        match parse_command(&line?) {
            Ok(ExploreCommand::Select(facet, selection)) => {
                dashboard.select(facet, selection);
            }
            Ok(ExploreCommand::Reset) => {
                dashboard.reset();
            }
            Ok(ExploreCommand::Facets) => {
                for facet in Facet::ALL {
                    println!(
                        "  {:<10} {} ({})",
                        facet.name().bold(),
                        dashboard.options().get(facet).join(", "),
                        format!("current: {}", dashboard.state().get(facet)).dimmed()
                    );
                }
            }
            Ok(ExploreCommand::Help) => print_explore_help(),
            Ok(ExploreCommand::Quit) => break,
            Err(message) => println!("  {} {}", "✗".red().bold(), message),
        }
    }
    Ok(())
}

fn print_explore_help() {
    println!("{}", "Commands:".dimmed());
    println!("  {}", "major <value|all>   year <value|all>   gpa <value|all>".dimmed());
    println!("  {}", "reset   facets   help   quit".dimmed());
}

// ---------------------------------------------------------------------------
// classpulse health
// ---------------------------------------------------------------------------

/// Check config files, backend reachability, and the event log.
pub fn run_health() -> Result<()> {
    println!("{}", "classpulse Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.classpulse/config.toml found"
        } else {
            "not found (run `classpulse config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".classpulse.toml found"
        } else {
            "none (optional)"
        },
    );
    print_health_item(
        "Aggregates",
        true,
        &format!("{} (top {})", cfg.aggregates.mode, cfg.aggregates.top_n),
    );

    let backend = HttpSource::from_config(&cfg.source);
    let reachable = backend.is_reachable();
    print_health_item(
        "Backend",
        reachable,
        &if reachable {
            format!("reachable at {}", backend.base_url())
        } else {
            format!("not reachable at {}", backend.base_url())
        },
    );

    if reachable {
        let aggregates = BackendAggregates::fetch(&backend);
        let failures = aggregates.failures();
        let detail = if failures.is_empty() {
            "all /api/* aggregates answered".to_string()
        } else {
            failures
                .iter()
                .map(|(endpoint, reason)| format!("{endpoint}: {reason}"))
                .collect::<Vec<_>>()
                .join("; ")
        };
        print_health_item("Aggregate endpoints", failures.is_empty(), &detail);
    }

    let log = EventLog::from_config(&cfg.logging);
    match log.path() {
        None => print_health_item("Event log", true, "disabled"),
        Some(path) if path.exists() => print_health_item(
            "Event log",
            true,
            &format!("{} events in {}", log.read_all().len(), path.display()),
        ),
        Some(_) => print_health_item("Event log", true, "no log file yet"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// classpulse config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective classpulse Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.classpulse/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.classpulse/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".classpulse.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".classpulse.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "CLASSPULSE_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.classpulse/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to point classpulse at your backend.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
