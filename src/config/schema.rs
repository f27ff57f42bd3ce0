/// Configuration schema and defaults for classpulse.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[source]`, `[aggregates]`, `[labels]`, and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level classpulse configuration.
///
/// Maps directly to the `~/.classpulse/config.toml` and `.classpulse.toml`
/// file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClasspulseConfig {
    pub source: SourceConfig,
    pub aggregates: AggregatesConfig,
    pub labels: LabelsConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [source]
// ---------------------------------------------------------------------------

/// Where the survey data comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the dashboard backend serving `/api/*`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [aggregates]
// ---------------------------------------------------------------------------

/// Where the count-map charts get their input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateMode {
    /// Fetch the backend's `/api/*` aggregates once at load (default).
    #[default]
    Remote,
    /// Derive them from the filtered view on every recompute.
    Local,
}

impl std::fmt::Display for AggregateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatesConfig {
    /// `remote` or `local`.
    pub mode: AggregateMode,
    /// Entries shown by the top-N charts.
    pub top_n: usize,
}

impl Default for AggregatesConfig {
    fn default() -> Self {
        Self {
            mode: AggregateMode::default(),
            top_n: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// [labels]
// ---------------------------------------------------------------------------

/// Label width budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Line width for wrapped attendance labels.
    pub wrap_width: usize,
    /// Max characters of a skipping-reason label.
    pub skipping_max: usize,
    /// Max characters of an influencing-factor label.
    pub factors_max: usize,
    /// Max characters of a compensation-method label.
    pub compensation_max: usize,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            wrap_width: 25,
            skipping_max: 35,
            factors_max: 40,
            compensation_max: 35,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether dashboard events are logged.
    pub enabled: bool,
    /// Path to the event log file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.classpulse/events.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl ClasspulseConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `classpulse config init` to create a starting config file
    /// with all settings documented.
    pub fn default_toml() -> String {
        r#"# classpulse Configuration
# Survey attendance dashboard
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CLASSPULSE_*)
#   2. Project config (.classpulse.toml in current directory)
#   3. User global config (~/.classpulse/config.toml)
#   4. Built-in defaults

[source]
base_url = "http://127.0.0.1:5000"   # CLASSPULSE_URL
timeout_ms = 10000                    # CLASSPULSE_TIMEOUT_MS

[aggregates]
mode = "remote"                       # remote | local (CLASSPULSE_AGGREGATES)
top_n = 8

[labels]
wrap_width = 25
skipping_max = 35
factors_max = 40
compensation_max = 35

[logging]
enabled = true                        # CLASSPULSE_LOG
path = "~/.classpulse/events.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = ClasspulseConfig::default();
        assert_eq!(config.source.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.source.timeout_ms, 10_000);
        assert_eq!(config.aggregates.mode, AggregateMode::Remote);
        assert_eq!(config.aggregates.top_n, 8);
        assert_eq!(config.labels.wrap_width, 25);
        assert_eq!(config.labels.factors_max, 40);
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[aggregates]
mode = "local"
"#;
        let config: ClasspulseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.aggregates.mode, AggregateMode::Local);
        // Everything else falls back to defaults
        assert_eq!(config.aggregates.top_n, 8);
        assert_eq!(config.source.timeout_ms, 10_000);
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: ClasspulseConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClasspulseConfig::default());
    }

    #[test]
    fn default_toml_parses_back() {
        let config: ClasspulseConfig = toml::from_str(&ClasspulseConfig::default_toml()).unwrap();
        assert_eq!(config, ClasspulseConfig::default());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let result: Result<ClasspulseConfig, _> = toml::from_str("[aggregates]\nmode = \"hybrid\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn mode_display() {
        assert_eq!(AggregateMode::Remote.to_string(), "remote");
        assert_eq!(AggregateMode::Local.to_string(), "local");
    }
}
