#![forbid(unsafe_code)]

//! Durable key-value storage backends.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Read error | Unreadable backing store | `get` returns `None` |
//! | Write error | Full disk, read-only store | `set` returns [`StorageError`] |
//! | Quota | Value larger than the store permits | [`StorageError::QuotaExceeded`] |

use std::cell::RefCell;
use std::collections::BTreeMap;

/// Errors from durable storage writes.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing store could not be written.
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The store contents could not be encoded.
    #[error("storage encoding error: {0}")]
    Encoding(String),
    /// The write would exceed the store's capacity.
    #[error("storage quota exceeded writing {key} ({len} bytes)")]
    QuotaExceeded { key: String, len: usize },
    /// The store refuses writes.
    #[error("storage is read-only")]
    ReadOnly,
}

/// A durable string-to-string store.
///
/// Methods take `&self`; implementations provide their own interior
/// mutability so a store can be shared by an [`Environment`](crate::Environment).
pub trait KeyValueStore {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store, optionally with a byte quota per value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Option<usize>,
    read_only: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values longer than `bytes`.
    #[must_use]
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Reject every write.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Seed a value without going through the write checks.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.borrow_mut().insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        if let Some(quota) = self.quota
            && value.len() > quota
        {
            return Err(StorageError::QuotaExceeded {
                key: key.to_owned(),
                len: value.len(),
            });
        }
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
