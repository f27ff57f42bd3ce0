//! Dashboard event log.
//!
//! One JSON line per dashboard event: a load, a failed load, a facet
//! selection, a reset, or a metric that could not be computed. Writing is
//! best-effort; a log that cannot be written never affects the dashboard.
//!
//! Log file: `~/.classpulse/events.jsonl` (configurable via `[logging]`).

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// A single dashboard event. Only the fields relevant to the event kind are
/// set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardEvent {
    pub timestamp: String,
    /// `"load"`, `"load_failed"`, `"select"`, `"reset"` or `"metric_failed"`.
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub facet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metric: Option<String>,
    /// Records in the loaded dataset.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub records: Option<usize>,
    /// Records in the filtered view after the change.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub matched: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub filter_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

impl DashboardEvent {
    fn new(event: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            source: None,
            facet: None,
            value: None,
            metric: None,
            records: None,
            matched: None,
            filter_version: None,
            reason: None,
        }
    }

    pub fn load(source: &str, records: usize) -> Self {
        Self {
            source: Some(source.to_string()),
            records: Some(records),
            ..Self::new("load")
        }
    }

    pub fn load_failed(source: &str, reason: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            reason: Some(reason.to_string()),
            ..Self::new("load_failed")
        }
    }

    pub fn select(facet: &str, value: &str, matched: usize, filter_version: u64) -> Self {
        Self {
            facet: Some(facet.to_string()),
            value: Some(value.to_string()),
            matched: Some(matched),
            filter_version: Some(filter_version),
            ..Self::new("select")
        }
    }

    pub fn reset(matched: usize, filter_version: u64) -> Self {
        Self {
            matched: Some(matched),
            filter_version: Some(filter_version),
            ..Self::new("reset")
        }
    }

    pub fn metric_failed(metric: &str, reason: &str, filter_version: u64) -> Self {
        Self {
            metric: Some(metric.to_string()),
            reason: Some(reason.to_string()),
            filter_version: Some(filter_version),
            ..Self::new("metric_failed")
        }
    }
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// Append-only JSONL event log. A log without a path drops every event.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn from_config(cfg: &LoggingConfig) -> Self {
        if !cfg.enabled {
            return Self::disabled();
        }
        Self {
            path: expand_home(&cfg.path).or_else(default_log_path),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Log an event. Best-effort; failures are silently ignored.
    pub fn record(&self, event: &DashboardEvent) {
        let _ = self.append(event);
    }

    /// Read every event back. Malformed lines are skipped; a missing file
    /// yields an empty vec.
    pub fn read_all(&self) -> Vec<DashboardEvent> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        let reader = BufReader::new(file);
        reader
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<DashboardEvent>(&line).ok())
            .collect()
    }

    fn append(&self, event: &DashboardEvent) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(event)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Expand a leading `~/` to the home directory. Empty paths yield `None`.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path.is_empty() {
        return None;
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

/// Default event log location.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".classpulse").join("events.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
