//! FontStorage trait for persisting user-supplied fonts.
//!
//! The custom font store enforces its quota on top of this surface; storage
//! backends only move bytes.

use async_trait::async_trait;
use fontweave_types::CustomFontRecord;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::RwLock;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Failed to persist record '{id}': {message}")]
    WriteFailed { id: String, message: String },

    #[error("Corrupt record '{id}': {message}")]
    Corrupt { id: String, message: String },

    #[error("Invalid record id: {0}")]
    InvalidId(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// A durable key-value surface keyed by font id.
///
/// # Implementations
///
/// - `InMemoryFontStorage`: volatile, always available
/// - `FilesystemFontStorage` (fontweave-resource): one directory per store
#[async_trait]
pub trait FontStorage: Send + Sync + Debug {
    /// Load every persisted record.
    async fn load_all(&self) -> Result<Vec<CustomFontRecord>, StorageError>;

    /// Insert or overwrite the record with `record.id`.
    async fn put(&self, record: &CustomFontRecord) -> Result<(), StorageError>;

    /// Remove a record. Removing a missing id is not an error.
    async fn remove(&self, id: &str) -> Result<(), StorageError>;

    /// Remove every record.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Returns a human-readable name for this backend (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// A volatile storage backend.
///
/// Records are kept in id order so `load_all` is deterministic.
#[derive(Debug, Default)]
pub struct InMemoryFontStorage {
    records: RwLock<BTreeMap<String, CustomFontRecord>>,
}

impl InMemoryFontStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored records.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Returns `true` if the lock is poisoned (safe default).
    pub fn is_empty(&self) -> bool {
        self.records.read().map(|r| r.is_empty()).unwrap_or(true)
    }
}

fn poisoned(id: &str) -> StorageError {
    StorageError::WriteFailed {
        id: id.to_string(),
        message: "storage lock poisoned".to_string(),
    }
}

#[async_trait]
impl FontStorage for InMemoryFontStorage {
    async fn load_all(&self) -> Result<Vec<CustomFontRecord>, StorageError> {
        let records = self.records.read().map_err(|_| poisoned("*"))?;
        Ok(records.values().cloned().collect())
    }

    async fn put(&self, record: &CustomFontRecord) -> Result<(), StorageError> {
        if record.id.is_empty() {
            return Err(StorageError::InvalidId(record.id.clone()));
        }
        let mut records = self.records.write().map_err(|_| poisoned(&record.id))?;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| poisoned(id))?;
        records.remove(id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| poisoned("*"))?;
        records.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "InMemoryFontStorage"
    }
}
