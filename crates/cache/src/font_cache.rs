use crate::lru_cache::BoundedLruCache;
use chrono::{DateTime, Utc};
use fontweave_types::{FontKey, SharedFontData};
use std::sync::{Mutex, MutexGuard};

/// A resolved font binary owned by the cache.
#[derive(Debug, Clone)]
pub struct CachedFont {
    pub key: FontKey,
    pub bytes: SharedFontData,
    pub size_bytes: usize,
    pub inserted_at: DateTime<Utc>,
}

/// Read-only diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub evictions: u64,
}

/// Process-wide cache of remotely resolved fonts, shared between jobs.
///
/// Construct one per owning scope and hand it out behind an `Arc`; there is
/// no global instance.
pub struct FontCache {
    inner: Mutex<BoundedLruCache<FontKey, CachedFont>>,
}

impl FontCache {
    /// Item ceiling used when nothing else is configured.
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoundedLruCache::new(capacity)),
        }
    }

    // The cache holds no invariant a panicking holder could break halfway
    // (every mutation is a single lru call), so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, BoundedLruCache<FontKey, CachedFont>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the font bytes and marks the entry most recently used.
    pub fn get(&self, key: &FontKey) -> Option<SharedFontData> {
        let hit = self.lock().get(key).map(|f| f.bytes.clone());
        if hit.is_some() {
            log::debug!("Font cache hit: {}", key);
        } else {
            log::debug!("Font cache miss: {}", key);
        }
        hit
    }

    /// Full cached record, refreshing recency.
    pub fn get_entry(&self, key: &FontKey) -> Option<CachedFont> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: FontKey, bytes: SharedFontData) {
        let entry = CachedFont {
            key: key.clone(),
            size_bytes: bytes.len(),
            bytes,
            inserted_at: Utc::now(),
        };
        if let Some((evicted, _)) = self.lock().set(key, entry) {
            log::debug!("Font cache evicted {}", evicted);
        }
    }

    pub fn contains(&self, key: &FontKey) -> bool {
        self.lock().has(key)
    }

    pub fn remove(&self, key: &FontKey) -> Option<CachedFont> {
        self.lock().delete(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<FontKey> {
        self.lock().keys().cloned().collect()
    }

    /// Total bytes currently held.
    pub fn total_bytes(&self) -> usize {
        self.lock().values().map(|f| f.size_bytes).sum()
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.lock();
        CacheStats {
            size: cache.size(),
            capacity: cache.capacity(),
            evictions: cache.evictions(),
        }
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache").field("stats", &self.stats()).finish()
    }
}
