//! Filesystem-backed font storage for native platforms.
//!
//! Each record is written as two files inside the storage directory:
//! `<id>.json` holds the metadata and names the payload file
//! `<id>.<digest>.bin`, whose name is derived from the font bytes. A put
//! writes the new payload first and then renames the metadata into place,
//! which is the commit point. The previous payload is only removed after
//! that, so an interrupted overwrite leaves the old record intact plus at
//! worst an orphaned payload that nothing references.
//!
//! # Security
//!
//! Ids are restricted to ASCII alphanumerics plus `-`, `_` and `.` and may
//! not start with a dot, so no id can address a path outside the directory.

use async_trait::async_trait;
use fontweave_traits::{FontStorage, StorageError};
use fontweave_types::{CustomFontRecord, FontStyle, FontWeight};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordMeta {
    id: String,
    family: String,
    weight: FontWeight,
    style: FontStyle,
    size_bytes: usize,
    /// File name of the payload, relative to the storage directory.
    payload: String,
}

/// A storage backend that keeps records in a local directory.
#[derive(Debug)]
pub struct FilesystemFontStorage {
    root: PathBuf,
}

impl FilesystemFontStorage {
    /// Uses `root` as the storage directory, creating it if needed.
    pub async fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Returns the storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn meta_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        if !is_safe_id(id) {
            return Err(StorageError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }

    fn payload_path(&self, meta: &RecordMeta) -> Result<PathBuf, StorageError> {
        if !is_safe_id(&meta.payload) || !meta.payload.ends_with(".bin") {
            return Err(StorageError::Corrupt {
                id: meta.id.clone(),
                message: format!("invalid payload name '{}'", meta.payload),
            });
        }
        Ok(self.root.join(&meta.payload))
    }

    async fn read_meta(&self, meta_path: &Path) -> Result<RecordMeta, StorageError> {
        let raw = tokio::fs::read(meta_path).await?;
        serde_json::from_slice(&raw).map_err(|e| StorageError::Corrupt {
            id: meta_path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// The metadata currently committed for `id`, if it can be read.
    async fn committed_meta(&self, meta_path: &Path) -> Option<RecordMeta> {
        match tokio::fs::try_exists(meta_path).await {
            Ok(true) => self.read_meta(meta_path).await.ok(),
            _ => None,
        }
    }

    async fn read_record(&self, meta_path: &Path) -> Result<CustomFontRecord, StorageError> {
        let meta = self.read_meta(meta_path).await?;
        let bytes = tokio::fs::read(self.payload_path(&meta)?).await?;
        if bytes.len() != meta.size_bytes {
            return Err(StorageError::Corrupt {
                id: meta.id,
                message: format!("expected {} bytes, found {}", meta.size_bytes, bytes.len()),
            });
        }
        Ok(CustomFontRecord::new(meta.id, meta.family, meta.weight, meta.style, Arc::new(bytes)))
    }
}

fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Payload file name for `bytes` stored under `id`.
fn payload_name(id: &str, bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!("{}.{}.bin", id, &digest[..16])
}

async fn write_atomically(path: &Path, data: &[u8]) -> Result<(), std::io::Error> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await
}

async fn remove_if_present(path: &Path) -> Result<(), std::io::Error> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[async_trait]
impl FontStorage for FilesystemFontStorage {
    async fn load_all(&self) -> Result<Vec<CustomFontRecord>, StorageError> {
        let mut records = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path).await {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable font record {}: {}", path.display(), e),
            }
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn put(&self, record: &CustomFontRecord) -> Result<(), StorageError> {
        let meta_path = self.meta_path(&record.id)?;
        let previous = self.committed_meta(&meta_path).await;
        let meta = RecordMeta {
            id: record.id.clone(),
            family: record.family.clone(),
            weight: record.weight,
            style: record.style,
            size_bytes: record.bytes.len(),
            payload: payload_name(&record.id, &record.bytes),
        };
        let meta_json = serde_json::to_vec_pretty(&meta).map_err(|e| StorageError::WriteFailed {
            id: record.id.clone(),
            message: e.to_string(),
        })?;

        let write_failed = |e: std::io::Error| StorageError::WriteFailed {
            id: record.id.clone(),
            message: e.to_string(),
        };
        write_atomically(&self.root.join(&meta.payload), &record.bytes)
            .await
            .map_err(write_failed)?;
        write_atomically(&meta_path, &meta_json).await.map_err(write_failed)?;

        if let Some(previous) = previous.filter(|p| p.payload != meta.payload) {
            if let Ok(old) = self.payload_path(&previous) {
                if let Err(e) = remove_if_present(&old).await {
                    log::warn!("Could not remove replaced payload {}: {}", old.display(), e);
                }
            }
        }
        log::debug!("Persisted font '{}' to {}", record.id, self.root.display());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let meta_path = self.meta_path(id)?;
        let previous = self.committed_meta(&meta_path).await;
        remove_if_present(&meta_path).await?;
        if let Some(previous) = previous {
            remove_if_present(&self.payload_path(&previous)?).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if matches!(ext, Some("json") | Some("bin") | Some("tmp")) {
                remove_if_present(&path).await?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "FilesystemFontStorage"
    }
}
