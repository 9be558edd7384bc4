//! File-backed JSON key/value store owned by a single module.
//!
//! # Layout
//!
//! ```text
//! <data_dir>/modules/<module id, lower-cased>.json
//! {
//!   "key": <any JSON value>,
//!   ...
//! }
//! ```
//!
//! Every mutation rewrites the whole file (pretty-printed) before returning.
//! The file is written to a sibling `.tmp` file and renamed into place, so the
//! file on disk is always a complete JSON object.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from module store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("value of key '{key}' cannot be read as {target}")]
    TypeCoercion { key: String, target: &'static str },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persistent key/value store for one module.
///
/// Single operations are atomic with respect to each other. Sequences such as
/// `set_default` followed by `get` are not; callers that need that must
/// serialize themselves.
#[derive(Debug)]
pub struct ModuleStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl ModuleStore {
    /// Open (or create) the store at `path`.
    ///
    /// Missing parent directories are created and a missing file is
    /// initialized with an empty object. An existing file that is not a JSON
    /// object is reported as [`StoreError::Corrupt`]; it is never reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }

        if !path.exists() {
            write_entries(&path, &Map::new())?;
            info!(path = %path.display(), "Created module store");
        }

        let raw = fs::read(&path).map_err(|source| io_error(&path, source))?;
        let entries = match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(StoreError::Corrupt {
                    path,
                    reason: "expected a JSON object".to_string(),
                });
            }
            Err(e) => {
                return Err(StoreError::Corrupt {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "Loaded module store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Open the store of the module `module_id` under `data_dir`.
    pub fn for_module(data_dir: &Path, module_id: &str) -> Result<Self, StoreError> {
        Self::open(Self::module_path(data_dir, module_id))
    }

    /// File location of a module's store.
    pub fn module_path(data_dir: &Path, module_id: &str) -> PathBuf {
        data_dir
            .join("modules")
            .join(format!("{}.json", module_id.to_lowercase()))
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// All keys, in file order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Raw JSON value of a key.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }

    /// Read a key as `T`.
    ///
    /// The stored value is decoded directly first. A stored string is then
    /// parsed as JSON text (`"42"` reads as `42`), and a stored number or
    /// boolean is offered as its text (`42` reads as `"42"`).
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let value = self
            .value(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;

        coerce(&value).ok_or_else(|| StoreError::TypeCoercion {
            key: key.to_string(),
            target: std::any::type_name::<T>(),
        })
    }

    /// Set a key and flush the store to disk.
    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<(), StoreError> {
        let key = key.into();
        let value = serde_json::to_value(value)?;

        let mut entries = self.entries.lock();
        let previous = entries.insert(key.clone(), value);
        if let Err(e) = write_entries(&self.path, &entries) {
            // Keep memory in step with the last committed file.
            match previous {
                Some(old) => entries.insert(key, old),
                None => entries.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Set a key only if it is absent. Returns whether the value was written.
    pub fn set_default<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<bool, StoreError> {
        let key = key.into();
        let mut entries = self.entries.lock();
        if entries.contains_key(&key) {
            return Ok(false);
        }

        entries.insert(key.clone(), serde_json::to_value(value)?);
        if let Err(e) = write_entries(&self.path, &entries) {
            entries.remove(&key);
            return Err(e);
        }
        Ok(true)
    }

    /// Remove a key, flushing if it existed.
    pub fn remove(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut entries = self.entries.lock();
        let Some(old) = entries.remove(key) else {
            return Ok(None);
        };
        if let Err(e) = write_entries(&self.path, &entries) {
            entries.insert(key.to_string(), old);
            return Err(e);
        }
        Ok(Some(old))
    }
}

fn coerce<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if let Ok(v) = T::deserialize(value) {
        return Some(v);
    }
    match value {
        Value::String(text) => serde_json::from_str(text).ok(),
        Value::Number(_) | Value::Bool(_) => T::deserialize(Value::String(value.to_string())).ok(),
        _ => None,
    }
}

fn write_entries(path: &Path, entries: &Map<String, Value>) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(entries)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, json).map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
