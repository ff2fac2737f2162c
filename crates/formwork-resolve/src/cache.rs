/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Injected cache stores with a per-key single-flight contract.
//!
//! The resolver's two caches (raw definitions, resolved templates) are
//! the only state shared across concurrent requests. They are injected —
//! not ambient statics — so tests can substitute [`NoopCache`] and
//! services can size or replace them.
//!
//! Contract: `get_or_try_init` computes at most once per key; concurrent
//! misses on the same key block on the one in-flight computation rather
//! than fanning out N fetches; a failed computation leaves the key empty
//! so a later call can retry once the source recovers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use crate::error::ResolveResult;

/// A keyed get-or-compute store.
pub trait CacheStore<V>: Send + Sync {
    /// Return the cached value for `key`, computing it with `init` on a
    /// miss. See the module docs for the single-flight contract.
    fn get_or_try_init(
        &self,
        key: &str,
        init: &mut dyn FnMut() -> ResolveResult<V>,
    ) -> ResolveResult<Arc<V>>;

    /// Drop every cached entry.
    fn invalidate(&self);
}

/// In-memory cache store.
///
/// Each key owns a `OnceCell`; the cell provides blocking compute-once
/// semantics, and an `Err` from `init` leaves it empty (no negative
/// caching).
#[derive(Debug)]
pub struct MemoryCache<V> {
    cells: Mutex<HashMap<String, Arc<OnceCell<Arc<V>>>>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        MemoryCache {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Number of populated entries (for tests and diagnostics).
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .expect("cache lock poisoned")
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    /// Whether the cache has no populated entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Send + Sync> CacheStore<V> for MemoryCache<V> {
    fn get_or_try_init(
        &self,
        key: &str,
        init: &mut dyn FnMut() -> ResolveResult<V>,
    ) -> ResolveResult<Arc<V>> {
        // Take the cell out under the map lock, then initialize outside
        // it: a slow fetch for one key must not block other keys.
        let cell = {
            let mut cells = self.cells.lock().expect("cache lock poisoned");
            Arc::clone(cells.entry(key.to_string()).or_default())
        };
        let value = cell.get_or_try_init(|| init().map(Arc::new))?;
        Ok(Arc::clone(value))
    }

    fn invalidate(&self) {
        self.cells.lock().expect("cache lock poisoned").clear();
    }
}

/// Cache store that never caches (deterministic tests, one-shot tools).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl<V: Send + Sync> CacheStore<V> for NoopCache {
    fn get_or_try_init(
        &self,
        _key: &str,
        init: &mut dyn FnMut() -> ResolveResult<V>,
    ) -> ResolveResult<Arc<V>> {
        init().map(Arc::new)
    }

    fn invalidate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;

    #[test]
    fn test_computes_once_per_key() {
        let cache: MemoryCache<String> = MemoryCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let value = cache
                .get_or_try_init("k", &mut || {
                    calls += 1;
                    Ok("value".to_string())
                })
                .unwrap();
            assert_eq!(*value, "value");
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let cache: MemoryCache<String> = MemoryCache::new();
        let err = cache
            .get_or_try_init("k", &mut || {
                Err(ResolveError::TemplateNotFound {
                    template_id: "k".to_string(),
                })
            })
            .unwrap_err();
        assert_eq!(err.code(), "TEMPLATE_NOT_FOUND");
        assert!(cache.is_empty());

        // The source recovered: the same key computes successfully now.
        let value = cache
            .get_or_try_init("k", &mut || Ok("recovered".to_string()))
            .unwrap();
        assert_eq!(*value, "recovered");
    }

    #[test]
    fn test_invalidate_clears_entries() {
        let cache: MemoryCache<i32> = MemoryCache::new();
        cache.get_or_try_init("a", &mut || Ok(1)).unwrap();
        cache.invalidate();
        assert!(cache.is_empty());
        let mut recomputed = false;
        cache
            .get_or_try_init("a", &mut || {
                recomputed = true;
                Ok(2)
            })
            .unwrap();
        assert!(recomputed);
    }

    #[test]
    fn test_concurrent_misses_deduplicate() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cache: Arc<MemoryCache<String>> = Arc::new(MemoryCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(std::thread::spawn(move || {
                let value = cache
                    .get_or_try_init("cold", &mut || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        Ok("computed".to_string())
                    })
                    .unwrap();
                assert_eq!(*value, "computed");
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
