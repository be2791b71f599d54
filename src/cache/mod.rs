//! Dependency byte cache with LRU eviction
//!
//! Shared across all load sessions in the viewer process: a texture fetched
//! for one model is reused by its siblings instead of hitting the storage
//! backend again. Entries are keyed by the XXH3 hash of the normalized
//! reference path and carry the backend's version tag; an insert with a
//! different version replaces the stale bytes.
//!
//! All map and recency updates happen under a single mutex, so concurrent
//! fetch completions never observe a partially written entry.

pub mod metrics;

pub use metrics::{CacheMetrics, CacheMetricsHandle};

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

struct CacheEntry {
    bytes: Arc<[u8]>,
    version: String,
    size: usize,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<u64, CacheEntry>,
    recency: VecDeque<u64>,
    current_bytes: usize,
}

/// Bounded byte cache for fetched dependency files
pub struct DependencyCache {
    state: Mutex<CacheState>,
    max_bytes: usize,
    metrics: CacheMetricsHandle,
}

impl DependencyCache {
    /// Create a cache with the given byte budget
    pub fn new(max_bytes: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_bytes,
            metrics: CacheMetricsHandle::new(),
        }
    }

    /// Look up a normalized key, refreshing its recency on a hit
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        let hash = xxh3_64(key.as_bytes());
        let mut state = self.state.lock();
        match state.entries.get(&hash) {
            Some(entry) => {
                let bytes = entry.bytes.clone();
                touch(&mut state.recency, hash);
                self.metrics.record_hit();
                Some(bytes)
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Insert or replace the entry for a normalized key.
    ///
    /// A same-version insert refreshes the bytes and recency; a
    /// different-version insert drops the stale entry first. Oversized
    /// values (larger than the whole budget) are not cached.
    pub fn insert(&self, key: &str, version: &str, bytes: Arc<[u8]>) {
        let size = bytes.len();
        if size > self.max_bytes {
            log::debug!("{key:?} ({size} bytes) exceeds the cache budget, not cached");
            return;
        }

        let hash = xxh3_64(key.as_bytes());
        let mut state = self.state.lock();

        if let Some(old) = state.entries.remove(&hash) {
            if old.version != version {
                log::debug!("{key:?} changed version {} -> {version}, replacing", old.version);
            }
            state.current_bytes -= old.size;
            remove_key(&mut state.recency, hash);
        }

        while state.current_bytes + size > self.max_bytes {
            let Some(oldest) = state.recency.pop_front() else {
                break;
            };
            if let Some(evicted) = state.entries.remove(&oldest) {
                state.current_bytes -= evicted.size;
                self.metrics.record_eviction();
            }
        }

        state.entries.insert(
            hash,
            CacheEntry {
                bytes,
                version: version.to_string(),
                size,
            },
        );
        state.recency.push_back(hash);
        state.current_bytes += size;
        self.metrics.record_insert(size);
    }

    /// Drop the entry for a key, e.g. when the host reports a file change
    pub fn invalidate(&self, key: &str) {
        let hash = xxh3_64(key.as_bytes());
        let mut state = self.state.lock();
        if let Some(entry) = state.entries.remove(&hash) {
            state.current_bytes -= entry.size;
            remove_key(&mut state.recency, hash);
        }
    }

    /// Drop everything
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.recency.clear();
        state.current_bytes = 0;
    }

    /// Current number of cached entries
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently held
    pub fn memory_usage(&self) -> usize {
        self.state.lock().current_bytes
    }

    pub fn metrics(&self) -> &CacheMetricsHandle {
        &self.metrics
    }
}

fn touch(recency: &mut VecDeque<u64>, hash: u64) {
    remove_key(recency, hash);
    recency.push_back(hash);
}

fn remove_key(recency: &mut VecDeque<u64>, hash: u64) {
    if let Some(pos) = recency.iter().position(|&h| h == hash) {
        recency.remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(data: &[u8]) -> Arc<[u8]> {
        data.to_vec().into()
    }

    #[test]
    fn test_insert_and_get() {
        let cache = DependencyCache::new(1024);
        cache.insert("models/tex.png", "v1", bytes(b"png"));

        assert_eq!(&*cache.get("models/tex.png").unwrap(), b"png");
        assert!(cache.get("models/other.png").is_none());
        assert_eq!(cache.metrics().hits(), 1);
        assert_eq!(cache.metrics().misses(), 1);
    }

    #[test]
    fn test_lru_eviction_respects_budget() {
        let cache = DependencyCache::new(10);
        cache.insert("a", "v1", bytes(b"aaaa"));
        cache.insert("b", "v1", bytes(b"bbbb"));
        // Touch "a" so "b" is the eviction candidate
        let _ = cache.get("a");
        cache.insert("c", "v1", bytes(b"cccc"));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert!(cache.memory_usage() <= 10);
        assert_eq!(cache.metrics().evictions(), 1);
    }

    #[test]
    fn test_version_change_replaces_bytes() {
        let cache = DependencyCache::new(1024);
        cache.insert("tex.png", "v1", bytes(b"old"));
        cache.insert("tex.png", "v2", bytes(b"new"));

        assert_eq!(cache.len(), 1);
        assert_eq!(&*cache.get("tex.png").unwrap(), b"new");
    }

    #[test]
    fn test_invalidate() {
        let cache = DependencyCache::new(1024);
        cache.insert("tex.png", "v1", bytes(b"data"));
        cache.invalidate("tex.png");

        assert!(cache.get("tex.png").is_none());
        assert_eq!(cache.memory_usage(), 0);
    }

    #[test]
    fn test_oversized_value_not_cached() {
        let cache = DependencyCache::new(4);
        cache.insert("big", "v1", bytes(b"too large"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = DependencyCache::new(1024);
        cache.insert("a", "v1", bytes(b"1"));
        cache.insert("b", "v1", bytes(b"2"));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage(), 0);
    }
}
