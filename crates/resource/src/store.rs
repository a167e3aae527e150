use fontweave_traits::{FontStorage, InMemoryFontStorage, StorageError};
use fontweave_types::{CustomFontRecord, ErrorKind, FontDataError, FontKey, SharedFontData, normalize_family};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Quota exceeded: saving {requested} bytes would bring the store to {total} of {max} bytes")]
    QuotaExceeded {
        requested: usize,
        total: usize,
        max: usize,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid font record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            StoreError::Storage(_) => ErrorKind::StorageError,
            StoreError::InvalidRecord(_) => ErrorKind::ValidationError,
        }
    }
}

impl From<FontDataError> for StoreError {
    fn from(err: FontDataError) -> Self {
        StoreError::InvalidRecord(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub count: usize,
    pub total_bytes: usize,
    pub max_bytes: usize,
    pub percent_used: f64,
}

#[derive(Default)]
struct StoreState {
    records: BTreeMap<String, CustomFontRecord>,
    total_bytes: usize,
}

impl StoreState {
    fn from_records(records: Vec<CustomFontRecord>) -> Self {
        let mut state = StoreState::default();
        for record in records {
            state.total_bytes += record.size_bytes;
            if let Some(previous) = state.records.insert(record.id.clone(), record) {
                state.total_bytes -= previous.size_bytes;
            }
        }
        state
    }
}

/// Durable, quota-enforced store of user-supplied fonts.
///
/// Reads are served from an in-memory index. Mutations are serialised
/// through an async gate that is held across the storage write, and the
/// index is only updated once the backend has accepted the change, so
/// `get_stats` never sees a record that failed to persist.
pub struct CustomFontStore {
    storage: Arc<dyn FontStorage>,
    state: RwLock<StoreState>,
    write_gate: tokio::sync::Mutex<()>,
    max_bytes: usize,
}

impl CustomFontStore {
    /// Quota used when nothing else is configured (50 MiB).
    pub const DEFAULT_MAX_BYTES: usize = 50 * 1024 * 1024;

    /// Opens a store over `storage`, loading every previously saved record.
    pub async fn open(storage: Arc<dyn FontStorage>, max_bytes: usize) -> Result<Self, StoreError> {
        let records = storage.load_all().await?;
        let state = StoreState::from_records(records);
        if state.total_bytes > max_bytes {
            log::warn!(
                "Custom font store '{}' holds {} bytes, above its {} byte quota; new saves will be rejected",
                storage.name(),
                state.total_bytes,
                max_bytes
            );
        }
        log::info!(
            "Opened custom font store '{}' with {} fonts ({} bytes)",
            storage.name(),
            state.records.len(),
            state.total_bytes
        );
        Ok(Self {
            storage,
            state: RwLock::new(state),
            write_gate: tokio::sync::Mutex::new(()),
            max_bytes,
        })
    }

    /// A store backed by volatile memory.
    pub fn in_memory(max_bytes: usize) -> Self {
        Self {
            storage: Arc::new(InMemoryFontStorage::new()),
            state: RwLock::new(StoreState::default()),
            write_gate: tokio::sync::Mutex::new(()),
            max_bytes,
        }
    }

    // Index updates are single assignments under the write lock; a poisoned
    // lock still holds a consistent index.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// All records, ordered by id.
    pub fn get_all(&self) -> Vec<CustomFontRecord> {
        self.read().records.values().cloned().collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<CustomFontRecord> {
        self.read().records.get(id).cloned()
    }

    /// Inserts or overwrites by id.
    ///
    /// Fails with [`StoreError::QuotaExceeded`] when the resulting total would
    /// exceed the quota; the store is left exactly as it was.
    pub async fn save(&self, record: CustomFontRecord) -> Result<(), StoreError> {
        let record = validate(record)?;
        let _gate = self.write_gate.lock().await;

        let projected = {
            let state = self.read();
            let replaced = state.records.get(&record.id).map_or(0, |r| r.size_bytes);
            state.total_bytes - replaced + record.size_bytes
        };
        if projected > self.max_bytes {
            log::warn!(
                "Rejecting custom font '{}' ({} bytes): store would hold {} of {} bytes",
                record.id,
                record.size_bytes,
                projected,
                self.max_bytes
            );
            return Err(StoreError::QuotaExceeded {
                requested: record.size_bytes,
                total: projected,
                max: self.max_bytes,
            });
        }

        self.storage.put(&record).await?;

        let mut state = self.write();
        let size = record.size_bytes;
        if let Some(previous) = state.records.insert(record.id.clone(), record) {
            state.total_bytes -= previous.size_bytes;
        }
        state.total_bytes += size;
        Ok(())
    }

    /// Reads family, weight and style from the font itself, then saves it.
    pub async fn import(&self, id: impl Into<String>, bytes: Vec<u8>) -> Result<CustomFontRecord, StoreError> {
        let record = CustomFontRecord::from_font_bytes(id, bytes)?;
        self.save(record.clone()).await?;
        Ok(record)
    }

    /// Removes a record; returns whether it existed.
    pub async fn delete_by_id(&self, id: &str) -> Result<bool, StoreError> {
        let _gate = self.write_gate.lock().await;
        if !self.read().records.contains_key(id) {
            return Ok(false);
        }
        self.storage.remove(id).await?;

        let mut state = self.write();
        if let Some(previous) = state.records.remove(id) {
            state.total_bytes -= previous.size_bytes;
        }
        Ok(true)
    }

    pub async fn delete_all(&self) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;
        self.storage.clear().await?;
        *self.write() = StoreState::default();
        Ok(())
    }

    pub fn get_stats(&self) -> StoreStats {
        let state = self.read();
        let percent_used = if self.max_bytes == 0 {
            if state.total_bytes == 0 { 0.0 } else { 100.0 }
        } else {
            state.total_bytes as f64 / self.max_bytes as f64 * 100.0
        };
        StoreStats {
            count: state.records.len(),
            total_bytes: state.total_bytes,
            max_bytes: self.max_bytes,
            percent_used,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Whether any stored font belongs to `family` (compared normalized).
    pub fn has_family(&self, family: &str) -> bool {
        let wanted = normalize_family(family);
        self.read()
            .records
            .values()
            .any(|r| normalize_family(&r.family) == wanted)
    }

    /// Normalized family names of every stored font, sorted and deduplicated.
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .read()
            .records
            .values()
            .map(|r| normalize_family(&r.family))
            .collect();
        families.sort();
        families.dedup();
        families
    }

    /// Finds the closest stored face for `key` within the same family:
    /// matching style first, then the smallest weight distance (ties go to
    /// the heavier face).
    pub fn best_match(&self, key: &FontKey) -> Option<(CustomFontRecord, SharedFontData)> {
        let state = self.read();
        state
            .records
            .values()
            .filter(|r| normalize_family(&r.family) == key.family())
            .min_by_key(|r| {
                let style_penalty = u16::from(r.style != key.style);
                let distance = r.weight.value().abs_diff(key.weight.value());
                let lighter = u16::from(r.weight < key.weight);
                (style_penalty, distance, lighter)
            })
            .map(|r| (r.clone(), r.bytes.clone()))
    }
}

impl std::fmt::Debug for CustomFontStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomFontStore")
            .field("storage", &self.storage.name())
            .field("stats", &self.get_stats())
            .finish()
    }
}

fn validate(mut record: CustomFontRecord) -> Result<CustomFontRecord, StoreError> {
    if record.id.trim().is_empty() {
        return Err(StoreError::InvalidRecord("id must not be empty".to_string()));
    }
    if record.family.trim().is_empty() {
        return Err(StoreError::InvalidRecord(format!("font '{}' has no family", record.id)));
    }
    if record.bytes.is_empty() {
        return Err(StoreError::InvalidRecord(format!("font '{}' has no data", record.id)));
    }
    record.size_bytes = record.bytes.len();
    Ok(record)
}
