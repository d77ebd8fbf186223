//! Session cache of built previews
//!
//! Entries are keyed by object identity, handler and fetch mode, so an
//! automatic (soft-cap) preview and a manual (hard-cap) preview of the same
//! object never overwrite each other. Values are immutable once stored.

use super::types::{CacheEntry, HandlerId, LoadMode};
use moka::sync::Cache;

/// Identity of a cached preview
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub container: String,
    pub key: String,
    pub handler: HandlerId,
    pub load_mode: LoadMode,
}

impl CacheKey {
    #[must_use]
    pub fn new(
        container: impl Into<String>,
        key: impl Into<String>,
        handler: HandlerId,
        load_mode: LoadMode,
    ) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
            handler,
            load_mode,
        }
    }
}

/// Shared cache of built previews
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Clone)]
pub struct PreviewCache {
    entries: Cache<CacheKey, CacheEntry>,
}

impl PreviewCache {
    /// Create an unbounded cache
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_entries(None)
    }

    /// Create a cache, bounded when `max_entries` is set
    #[must_use]
    pub fn with_max_entries(max_entries: Option<u64>) -> Self {
        let entries = match max_entries {
            Some(max) => Cache::new(max),
            None => Cache::builder().build(),
        };
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key)
    }

    /// Store `entry` unless the key is already present
    ///
    /// Returns the value that ended up in the cache, which is the earlier
    /// entry when two builds race for the same key.
    pub fn insert(&self, key: CacheKey, entry: CacheEntry) -> CacheEntry {
        self.entries.entry(key).or_insert_with(|| entry).into_value()
    }

    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Number of stored previews
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self::new()
    }
}
