//! Persistent credential storage.
//!
//! [`FileStore`] keeps a small JSON object of string values, addressed by a
//! fixed key, so other values that happen to live in the same file survive
//! a login or logout. [`MemoryStore`] is the in-process equivalent.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

/// Key the credential is stored under.
pub const STORAGE_KEY: &str = "churn_v2_token";

/// Failure to read or write persisted session state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access session file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session file {} is not a JSON object: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },
}

/// Somewhere a single credential string can be persisted.
pub trait CredentialStore {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&mut self, token: &str) -> Result<(), StoreError>;
    fn remove(&mut self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

type Entries = serde_json::Map<String, serde_json::Value>;

/// JSON file store, e.g. `~/.churnctl/session.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    key: String,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: STORAGE_KEY.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Entries, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(io_err)
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(&self.key)
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    fn save(&mut self, token: &str) -> Result<(), StoreError> {
        let mut entries = self.read_entries()?;
        entries.insert(
            self.key.clone(),
            serde_json::Value::String(token.to_string()),
        );
        self.write_entries(&entries)
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            // An unreadable file holds no usable credential; start over.
            Err(StoreError::Corrupt { .. }) => Entries::new(),
            Err(e) => return Err(e),
        };
        let had_key = entries.remove(&self.key).is_some();
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                }),
            };
        }
        if !had_key {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-process store. Clones share the same slot, which lets a second
/// session observe what the first one persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(token.to_string()))),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&mut self, token: &str) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = Some(token.to_string());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
