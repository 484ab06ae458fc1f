//! Structured activity log (`~/.churnctl/activity.jsonl`).
//!
//! Every API call appends one JSON line describing what was requested and
//! how it ended. Writes are best-effort: a log failure never fails the
//! action that produced it. The bearer credential is never recorded.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, ChurnConfig};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// A single line of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    /// What the user asked for: `login`, `predict`, `batch`, `insights`, `ping`.
    #[serde(default)]
    pub action: String,
    /// Endpoint path, e.g. `/predict`.
    pub path: String,
    pub method: String,
    /// HTTP status, absent when the request never got a response.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    pub ok: bool,
    /// Error classification for failed calls (`unauthenticated`, `server`, ...).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<String>,
    /// Whether an `Authorization` header was attached.
    #[serde(default)]
    pub authenticated: bool,
    pub latency_ms: u64,
}

/// Handle to the activity log file. Disabled handles drop every entry.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn from_config(config: &ChurnConfig) -> Self {
        if config.logging.enabled {
            Self::at(config::expand_path(&config.logging.path))
        } else {
            Self::disabled()
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record the outcome of one request.
    pub fn record(
        &self,
        action: &str,
        method: &str,
        path: &str,
        status: Option<u16>,
        error_kind: Option<&str>,
        authenticated: bool,
        latency_ms: u64,
    ) {
        let Some(log_path) = &self.path else {
            return;
        };

        let entry = ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            action: action.to_string(),
            path: path.to_string(),
            method: method.to_string(),
            status,
            ok: error_kind.is_none(),
            error_kind: error_kind.map(str::to_string),
            authenticated,
            latency_ms,
        };

        let _ = append_entry(log_path, &entry);
    }

    /// Read every entry in the log, oldest first.
    ///
    /// Malformed lines are skipped. A missing file yields an empty list.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
            .collect()
    }

    /// The `limit` most recent entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut entries = self.read_all();
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        entries
    }
}

fn append_entry(path: &Path, entry: &ActivityEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
