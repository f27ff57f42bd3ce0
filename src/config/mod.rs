/// Configuration system for classpulse.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::ClasspulseConfig::default()`]
/// 2. **User global config**: `~/.classpulse/config.toml`
/// 3. **Project local config**: `.classpulse.toml` in the current directory
/// 4. **Environment variables**: `CLASSPULSE_*` overrides (highest precedence)
///
/// Later layers override earlier ones. Missing sections in a TOML file fall
/// back to defaults.
///
/// # Usage
///
/// ```rust,ignore
/// use classpulse::config;
///
/// let cfg = config::load();
/// let source = HttpSource::from_config(&cfg.source);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::{AggregateMode, ClasspulseConfig};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> ClasspulseConfig {
    let layers = [
        // Layer 2: user global config (~/.classpulse/config.toml)
        load_toml_file(global_config_path()),
        // Layer 3: project local config (.classpulse.toml)
        load_toml_file(project_config_path()),
    ];
    let mut config = resolve_layers(layers.into_iter().flatten());

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken config file never stops the dashboard
/// from starting.
fn load_toml_file(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // A file the schema cannot load is skipped as a whole
    value.clone().try_into::<ClasspulseConfig>().ok()?;
    Some(value)
}

/// Fold file layers over the built-in defaults and deserialize once.
///
/// Falls back to the defaults if the merged tree does not fit the schema.
fn resolve_layers(layers: impl IntoIterator<Item = toml::Value>) -> ClasspulseConfig {
    let Ok(mut merged) = toml::Value::try_from(ClasspulseConfig::default()) else {
        return ClasspulseConfig::default();
    };
    for layer in layers {
        merge_toml(&mut merged, layer);
    }
    merged.try_into().unwrap_or_default()
}

/// Deep-merge `overlay` into `base`.
///
/// Tables merge key by key. Any other value in the overlay replaces the one
/// in the base, so a layer only changes the keys it actually sets.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.classpulse/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".classpulse").join("config.toml"))
}

/// Path to the project local config: `.classpulse.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".classpulse.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CLASSPULSE_URL`: backend base URL
/// - `CLASSPULSE_TIMEOUT_MS`: per-request timeout
/// - `CLASSPULSE_AGGREGATES`: aggregate mode (`remote`, `local`)
/// - `CLASSPULSE_LOG`: event log on/off (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut ClasspulseConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("CLASSPULSE_URL")
        && !val.is_empty()
    {
        config.source.base_url = val;
    }
    if let Some(val) = var("CLASSPULSE_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.source.timeout_ms = ms;
    }
    if let Some(val) = var("CLASSPULSE_AGGREGATES")
        && let Some(mode) = parse_aggregate_mode(&val)
    {
        config.aggregates.mode = mode;
    }
    if let Some(val) = var("CLASSPULSE_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse an aggregate mode string.
pub fn parse_aggregate_mode(val: &str) -> Option<AggregateMode> {
    match val.to_ascii_lowercase().as_str() {
        "remote" | "backend" => Some(AggregateMode::Remote),
        "local" | "client" => Some(AggregateMode::Local),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.classpulse/config.toml`.
///
/// Creates the `~/.classpulse/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.classpulse/ directory")?;
    }

    fs::write(&path, ClasspulseConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `aggregates.mode`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&ClasspulseConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    // Reject values the schema cannot load, e.g. an unknown mode
    let updated = toml::to_string_pretty(&value_table).context("failed to serialize config")?;
    toml::from_str::<ClasspulseConfig>(&updated)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("empty config key segment in '{key}'");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // Parse according to the type of the existing value
    let new_value = match table.get(leaf) {
        None => anyhow::bail!("config key not found: '{key}'"),
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
