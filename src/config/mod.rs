/// Configuration system for churnctl.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — [`schema::ChurnConfig::default()`]
/// 2. **User global config** — `~/.churnctl/config.toml`
/// 3. **Project local config** — `.churnctl.toml` in the current directory
/// 4. **Environment variables** — `CHURNCTL_*` overrides (highest precedence)
///
/// Layers are merged key by key: a file that only sets `api.base_url`
/// leaves every other value from the previous layer untouched.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::{ChurnConfig, OutputFormat};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> ChurnConfig {
    let mut merged = match toml::Value::try_from(ChurnConfig::default()) {
        Ok(value) => value,
        Err(_) => return ChurnConfig::default(),
    };

    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = load_toml_value(path) {
            apply_layer(&mut merged, layer);
        }
    }

    let mut config: ChurnConfig = merged.try_into().unwrap_or_default();
    apply_env_overrides(&mut config);
    config
}

/// Read a TOML file as an untyped value tree.
///
/// Missing or malformed files yield `None` and are skipped.
fn load_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let content = fs::read_to_string(path?).ok()?;
    toml::from_str(&content).ok()
}

/// Overlay one file's values, unless doing so would no longer describe a
/// valid [`ChurnConfig`]. A layer with a wrong-typed value is dropped whole
/// and the layers below it stay in effect.
fn apply_layer(merged: &mut toml::Value, layer: toml::Value) -> bool {
    let mut candidate = merged.clone();
    merge_values(&mut candidate, layer);
    if candidate.clone().try_into::<ChurnConfig>().is_err() {
        return false;
    }
    *merged = candidate;
    true
}

/// Recursively overlay `overlay` onto `base`. Tables merge; scalars replace.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
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

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".churnctl").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".churnctl.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    Path::new(raw).to_path_buf()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CHURNCTL_API_URL` — API base address
/// - `CHURNCTL_TIMEOUT_MS` — request timeout
/// - `CHURNCTL_SESSION_PATH` — session file location
/// - `CHURNCTL_LOG` — activity logging (`1`/`true`/`yes`/`on`)
/// - `CHURNCTL_FORMAT` — `table` or `json`
fn apply_env_overrides(config: &mut ChurnConfig) {
    if let Ok(val) = std::env::var("CHURNCTL_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("CHURNCTL_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("CHURNCTL_SESSION_PATH")
        && !val.is_empty()
    {
        config.session.path = val;
    }
    if let Ok(val) = std::env::var("CHURNCTL_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("CHURNCTL_FORMAT")
        && let Some(format) = OutputFormat::parse(&val)
    {
        config.display.format = format;
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.churnctl/config.toml`.
///
/// Fails if the file already exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    write_config_file(&path, &ChurnConfig::default_toml())?;
    Ok(path)
}

/// Set a dotted key (e.g. `api.base_url`) in the global config file.
///
/// The new value keeps the type of the value it replaces. Unknown keys are
/// rejected so a typo never silently creates a dead setting.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config file")?
    } else {
        toml::Value::try_from(ChurnConfig::default())
            .context("failed to serialize default config")?
    };

    // Validate the key against the full schema, even if the file is sparse.
    let mut schema =
        toml::Value::try_from(ChurnConfig::default()).context("failed to serialize schema")?;
    set_toml_value(&mut schema, key, value)?;

    ensure_section(&mut root, key);
    set_toml_value(&mut root, key, value)?;

    // Reject values that would make the file unloadable.
    let _: ChurnConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize config")?;
    write_config_file(&path, &output)
}

/// Make sure the parent tables of a dotted key exist, copying the leaf from
/// the defaults so its type is known.
fn ensure_section(root: &mut toml::Value, key: &str) {
    let Some((section, leaf)) = key.split_once('.') else {
        return;
    };
    let Some(table) = root.as_table_mut() else {
        return;
    };
    let section_value = table
        .entry(section.to_string())
        .or_insert(toml::Value::Table(toml::map::Map::new()));

    if let Some(section_table) = section_value.as_table_mut()
        && !section_table.contains_key(leaf)
        && let Ok(defaults) = toml::Value::try_from(ChurnConfig::default())
        && let Some(default_leaf) = defaults.get(section).and_then(|s| s.get(leaf))
    {
        section_table.insert(leaf.to_string(), default_leaf.clone());
    }
}

/// Set a value in a TOML tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (parents.split('.').collect::<Vec<_>>(), leaf),
        None => (Vec::new(), key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    for part in parents {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a table above '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' cannot be set from the command line"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

fn write_config_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, contents).context("failed to write config file")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
