//! Key/value storage for the Gemini API key.
//!
//! The on-disk store keeps a flat JSON object in
//! `~/.local/share/gemini-panel/storage.json`. Every operation goes back to
//! the file, so two components holding the same store always agree on what is
//! persisted.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Storage key holding the Gemini API key.
pub const CREDENTIAL_KEY: &str = "geminiApiKey";

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine local data directory")]
    NoDataDir,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed storage file {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A string key/value store injected into the flows.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Check whether `key` currently holds a non-empty value.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some_and(|v| !v.is_empty()))
    }
}

/// JSON file backed store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default storage path.
    ///
    /// Returns `~/.local/share/gemini-panel/storage.json` on Linux.
    pub fn default_path() -> StoreResult<PathBuf> {
        let data_dir = dirs::data_local_dir().ok_or(StoreError::NoDataDir)?;
        Ok(data_dir.join("gemini-panel").join("storage.json"))
    }

    /// Open the store at the default location.
    pub fn open_default() -> StoreResult<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> StoreResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let file = File::open(&self.path).map_err(|e| {
            StoreError::io(format!("failed to open {}", self.path.display()), e)
        })?;
        let reader = BufReader::new(file);

        serde_json::from_reader(reader).map_err(|source| StoreError::Malformed {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Read the map for a read-modify-write.
    ///
    /// A malformed file is replaced rather than kept: it holds nothing
    /// readable, and refusing to write would leave the store stuck.
    /// Returns the map and whether the file needs rewriting regardless.
    fn read_map_for_update(&self) -> StoreResult<(Map<String, Value>, bool)> {
        match self.read_map() {
            Ok(map) => Ok((map, false)),
            Err(e @ StoreError::Malformed { .. }) => {
                tracing::warn!("Discarding unreadable credential store: {}", e);
                Ok((Map::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    /// Write the whole map back with owner-only permissions.
    ///
    /// The map goes to a temp file next to the target which is then renamed
    /// over it, so the file is never left half written.
    fn write_map(&self, map: &Map<String, Value>) -> StoreResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .map_err(|e| StoreError::io(format!("failed to create {}", parent.display()), e))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| {
            StoreError::io(format!("failed to create temp file in {}", parent.display()), e)
        })?;

        #[cfg(unix)]
        {
            let context = format!("failed to set permissions on {}", temp.path().display());
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| StoreError::io(context, e))?;
        }

        let context = format!("failed to write {}", self.path.display());
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, map)
                .map_err(|e| StoreError::io(context.clone(), std::io::Error::other(e)))?;
            writer
                .flush()
                .map_err(|e| StoreError::io(context.clone(), e))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(context.clone(), e))?;

        temp.persist(&self.path)
            .map_err(|e| StoreError::io(context, e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let map = self.read_map()?;
        Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let (mut map, _) = self.read_map_for_update()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let (mut map, repair) = self.read_map_for_update()?;
        if map.remove(key).is_none() && !repair {
            return Ok(());
        }
        self.write_map(&map)
    }
}

/// Process-local store used by tests and by `--store :memory:`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `key = value`.
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.lock().insert(key.to_string(), value.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}
