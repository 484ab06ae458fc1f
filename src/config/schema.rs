/// Configuration schema and defaults for churnctl.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[session]`, `[logging]` and `[display]`. Every field has a
/// built-in default, so users only set the values they want to override.
use serde::{Deserialize, Serialize};

/// Default API base address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level churnctl configuration.
///
/// Maps directly to `~/.churnctl/config.toml` and `.churnctl.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Remote prediction service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base address all endpoint paths are appended to.
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 30_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

/// Where the bearer credential is persisted between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path to the session file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "~/.churnctl/session.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether API calls are appended to the activity log.
    pub enabled: bool,
    /// Path to the JSONL activity log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.churnctl/activity.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Coloured, human-readable terminal output.
    #[default]
    Table,
    /// The rendered view model as pretty JSON.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl OutputFormat {
    pub fn parse(val: &str) -> Option<Self> {
        match val.to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub format: OutputFormat,
}

impl ChurnConfig {
    /// Annotated default config written by `churnctl config init`.
    pub fn default_toml() -> String {
        r#"# churnctl configuration
#
# Precedence: built-in defaults < ~/.churnctl/config.toml < .churnctl.toml
# < CHURNCTL_* environment variables.

[api]
# Base address of the churn prediction service.
base_url = "http://127.0.0.1:8000"
# Request timeout in milliseconds.
timeout_ms = 30000

[session]
# File holding the bearer credential between invocations.
path = "~/.churnctl/session.json"

[logging]
# Append one JSON line per API call.
enabled = true
path = "~/.churnctl/activity.jsonl"

[display]
# "table" or "json"
format = "table"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
