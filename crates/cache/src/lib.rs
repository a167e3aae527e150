//! Capacity-bounded caches.
//!
//! [`BoundedLruCache`] is the generic single-owner structure; [`FontCache`]
//! wraps it behind a lock so concurrent font resolutions can share one
//! instance. Every check-then-mutate sequence happens under a single lock
//! acquisition, so no caller ever observes a half-applied insert.

mod font_cache;
mod lru_cache;

pub use font_cache::{CacheStats, CachedFont, FontCache};
pub use lru_cache::BoundedLruCache;
