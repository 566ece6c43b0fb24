//! # Persistent Store
//!
//! A tiny async key-value interface, plus two implementations:
//!
//! - [`MemoryStore`]: a `HashMap` behind a mutex, for tests and `--ephemeral`.
//! - [`FileStore`]: one JSON document on disk, e.g. `~/.tabhop/state.json`.
//!
//! File writes use atomic rename (write `.tmp`, then `rename()`) so a crash
//! never leaves a half-written history behind.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    Io(io::Error),
    /// The stored document (or a value in it) isn't what we wrote.
    Corrupt(String),
    /// The store can't be reached at all.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "store I/O error: {e}"),
            StoreError::Corrupt(msg) => write!(f, "store is corrupt: {msg}"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it was never set.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Stores `value` under `key`. Durable once this returns `Ok`.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

// ============================================================================
// On disk
// ============================================================================

/// The whole file: every key plus when it was last written.
#[derive(Serialize, Deserialize, Default, Debug)]
struct StateDocument {
    #[serde(default)]
    saved_at: i64,
    #[serde(default)]
    entries: BTreeMap<String, Value>,
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<StateDocument, StoreError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", self.path.display());
                return Ok(StateDocument::default());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        serde_json::from_str(&json).map_err(|e| {
            warn!("State file {} is unreadable: {}", self.path.display(), e);
            StoreError::Corrupt(e.to_string())
        })
    }

    /// Atomically write the document (via `.tmp` + rename).
    async fn write_document(&self, document: &StateDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path.with_extension("tmp");
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut document = self.read_document().await?;
        Ok(document.entries.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut document = self.read_document().await?;
        document.entries.insert(key.to_string(), value);
        document.saved_at = Utc::now().timestamp();
        self.write_document(&document).await
    }
}
