use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// A key-value store that never holds more than `capacity` entries.
///
/// Both reads (`get`) and writes (`set`) mark an entry as most recently used.
/// When an insert would exceed capacity, the single least recently used
/// entry is evicted first. `has` and the iterators do not touch recency.
pub struct BoundedLruCache<K: Hash + Eq, V> {
    inner: LruCache<K, V>,
    evictions: u64,
}

impl<K: Hash + Eq, V> BoundedLruCache<K, V> {
    /// Creates a cache holding at most `capacity` entries. A capacity of zero
    /// is raised to one.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            log::warn!("LRU cache capacity of 0 requested, using 1");
            NonZeroUsize::MIN
        });
        Self {
            inner: LruCache::new(cap),
            evictions: 0,
        }
    }

    /// Returns the value and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Inserts or overwrites `key`. Returns the evicted entry, if the insert
    /// pushed one out.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.inner.contains(&key) {
            self.inner.put(key, value);
            return None;
        }
        let evicted = self.inner.push(key, value);
        if evicted.is_some() {
            self.evictions += 1;
        }
        evicted
    }

    /// Membership test that leaves recency untouched.
    pub fn has(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    /// Drops every entry and resets the eviction counter.
    pub fn clear(&mut self) {
        self.inner.clear();
        self.evictions = 0;
    }

    pub fn size(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// Total entries evicted since construction or the last `clear`.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Entries from least to most recently used.
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter().rev()
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries().map(|(k, _)| k)
    }

    /// Values from least to most recently used.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_of(cache: &BoundedLruCache<u32, u32>) -> Vec<u32> {
        cache.keys().copied().collect()
    }

    #[test]
    fn evicts_least_recently_written() {
        let mut cache = BoundedLruCache::new(2);
        cache.set(1, 10);
        cache.set(2, 20);
        assert_eq!(cache.set(3, 30), Some((1, 10)));
        assert!(!cache.has(&1));
        assert_eq!(keys_of(&cache), vec![2, 3]);
        assert_eq!(cache.evictions(), 1);
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = BoundedLruCache::new(2);
        cache.set(1, 10);
        cache.set(2, 20);
        assert_eq!(cache.get(&1), Some(&10));
        cache.set(3, 30);
        assert!(cache.has(&1));
        assert!(!cache.has(&2));
        assert_eq!(keys_of(&cache), vec![1, 3]);
    }

    #[test]
    fn overwrite_refreshes_without_evicting() {
        let mut cache = BoundedLruCache::new(2);
        cache.set(1, 10);
        cache.set(2, 20);
        assert_eq!(cache.set(1, 11), None);
        assert_eq!(cache.size(), 2);
        assert_eq!(cache.evictions(), 0);
        assert_eq!(keys_of(&cache), vec![2, 1]);
        assert_eq!(cache.get(&1), Some(&11));
    }

    #[test]
    fn has_does_not_touch_recency() {
        let mut cache = BoundedLruCache::new(2);
        cache.set(1, 10);
        cache.set(2, 20);
        assert!(cache.has(&1));
        cache.set(3, 30);
        assert!(!cache.has(&1));
    }

    #[test]
    fn size_never_exceeds_capacity() {
        for capacity in 1..=8usize {
            let mut cache = BoundedLruCache::new(capacity);
            for key in 0..(capacity as u32 * 3) {
                cache.set(key, key);
                assert!(cache.size() <= capacity);
            }
            assert_eq!(cache.evictions(), (capacity as u64) * 2);
            let expected: Vec<u32> = ((capacity as u32 * 2)..(capacity as u32 * 3)).collect();
            assert_eq!(keys_of(&cache), expected);
        }
    }

    #[test]
    fn clear_resets_evictions() {
        let mut cache = BoundedLruCache::new(1);
        cache.set(1, 1);
        cache.set(2, 2);
        assert_eq!(cache.evictions(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.evictions(), 0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn delete_removes_entry() {
        let mut cache = BoundedLruCache::new(3);
        cache.set("a", 1);
        assert_eq!(cache.delete(&"a"), Some(1));
        assert_eq!(cache.delete(&"a"), None);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut cache = BoundedLruCache::new(0);
        cache.set(1, 1);
        cache.set(2, 2);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.values().copied().collect::<Vec<_>>(), vec![2]);
    }
}
