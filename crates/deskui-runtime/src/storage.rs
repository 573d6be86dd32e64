#![forbid(unsafe_code)]

//! File-backed [`KeyValueStore`].
//!
//! The whole store is one JSON object (`{"key": "value", ...}`) on disk.
//! Every write rewrites the file through a sibling temporary file followed by
//! a rename, so a crash mid-write leaves either the old or the new file, never
//! a truncated one. If the write fails, the in-memory view is left unchanged
//! and the temporary file is removed.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use deskui_core::{KeyValueStore, StorageError};

/// Durable store persisting a JSON map to a single file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|err| {
                StorageError::Encoding(format!("{}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "file store opened");
        Ok(Self {
            path,
            entries: RefCell::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|err| StorageError::Encoding(err.to_string()))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, raw)?;
        if let Err(err) = fs::rename(&temp, &self.path) {
            if let Err(cleanup) = fs::remove_file(&temp) {
                tracing::warn!(
                    path = %temp.display(),
                    error = %cleanup,
                    "failed to remove temp file"
                );
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn write_with(
        &self,
        edit: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let mut next = self.entries.borrow().clone();
        edit(&mut next);
        self.flush(&next)?;
        *self.entries.borrow_mut() = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write_with(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.entries.borrow().contains_key(key) {
            return Ok(());
        }
        self.write_with(|entries| {
            entries.remove(key);
        })
    }
}
