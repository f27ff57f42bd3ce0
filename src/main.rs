use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use classpulse::cli::{self, SourceChoice};
use classpulse::filter::FilterState;

#[derive(Debug, Parser)]
#[command(name = "classpulse")]
#[command(about = "Class attendance survey dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Backend base URL (default: from config)
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,
    /// Read records from a JSON file instead of the backend
    #[arg(long)]
    file: Option<PathBuf>,
}

impl SourceArgs {
    fn choice(&self) -> SourceChoice<'_> {
        SourceChoice {
            url: self.url.as_deref(),
            file: self.file.as_deref(),
        }
    }
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Only students of this major
    #[arg(long)]
    major: Option<String>,
    /// Only students in this year of study
    #[arg(long)]
    year: Option<String>,
    /// Only students in this GPA range
    #[arg(long)]
    gpa: Option<String>,
}

impl FilterArgs {
    fn state(&self) -> FilterState {
        cli::initial_filters(
            self.major.as_deref(),
            self.year.as_deref(),
            self.gpa.as_deref(),
        )
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render summary cards, every chart, and the insights
    Dashboard {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Derive every aggregate from the filtered records
        #[arg(long)]
        local: bool,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List the values each filter accepts
    Facets {
        #[command(flatten)]
        source: SourceArgs,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Print the generated insights for a filtered view
    Insights {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Change filters interactively and watch the dashboard update
    Explore {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Check config, backend reachability, and the event log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.classpulse/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `aggregates.mode local`
    Set { key: String, value: String },
    /// Restore the default config
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Dashboard {
            source,
            filters,
            local,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_dashboard(source.choice(), filters.state(), local, fmt)
        }
        Commands::Facets { source, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_facets(source.choice(), fmt)
        }
        Commands::Insights { source, filters } => {
            cli::run_insights(source.choice(), filters.state())
        }
        Commands::Explore { source } => cli::run_explore(source.choice()),
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
