//! Memoization of probe results per (store session, field).

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

type CacheKey = (String, String);

/// Caches one value per (session, field) for the life of the cache.
///
/// Each entry is a [`OnceCell`]: when several threads ask for the same
/// missing entry, exactly one runs the initializer and the others block
/// until its value is available.
#[derive(Debug)]
pub struct ProbeCache<V> {
    cells: RwLock<HashMap<CacheKey, Arc<OnceCell<V>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<V: Clone> ProbeCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Returns the cached value, running `init` if this is the first request
    /// for (`session`, `field`).
    pub fn get_or_init<F>(&self, session: &str, field: &str, init: F) -> V
    where
        F: FnOnce() -> V,
    {
        let cell = self.cell(session, field);
        let mut computed = false;
        let value = cell
            .get_or_init(|| {
                computed = true;
                init()
            })
            .clone();

        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Returns the cached value without computing it.
    pub fn get(&self, session: &str, field: &str) -> Option<V> {
        let key = (session.to_string(), field.to_string());
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .and_then(|cell| cell.get().cloned())
    }

    /// Number of initialized entries.
    pub fn size(&self) -> usize {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    /// Drops every entry for `session`.
    pub fn clear_session(&self, session: &str) {
        self.cells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(s, _), _| s != session);
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Gets cache statistics.
    pub fn stats(&self) -> ProbeCacheStats {
        ProbeCacheStats {
            entries: self.size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn cell(&self, session: &str, field: &str) -> Arc<OnceCell<V>> {
        let key = (session.to_string(), field.to_string());
        if let Some(cell) = self
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(cell);
        }
        Arc::clone(
            self.cells
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default(),
        )
    }
}

impl<V: Clone> Default for ProbeCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a [`ProbeCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeCacheStats {
    /// Initialized entries
    pub entries: usize,
    /// Requests answered from the cache
    pub hits: usize,
    /// Requests that ran the initializer
    pub misses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_initializes_once() {
        let cache: ProbeCache<bool> = ProbeCache::new();
        let mut runs = 0;
        assert!(cache.get_or_init("s1", "ring_time", || {
            runs += 1;
            true
        }));
        assert!(cache.get_or_init("s1", "ring_time", || {
            runs += 1;
            false
        }));
        assert_eq!(runs, 1);
        assert_eq!(
            cache.stats(),
            ProbeCacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_sessions_are_separate() {
        let cache: ProbeCache<u32> = ProbeCache::new();
        cache.get_or_init("s1", "data1", || 1);
        cache.get_or_init("s2", "data1", || 2);
        assert_eq!(cache.get("s1", "data1"), Some(1));
        assert_eq!(cache.get("s2", "data1"), Some(2));
        assert_eq!(cache.get("s3", "data1"), None);

        cache.clear_session("s1");
        assert_eq!(cache.get("s1", "data1"), None);
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_concurrent_single_init() {
        let cache: Arc<ProbeCache<usize>> = Arc::new(ProbeCache::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let runs = Arc::clone(&runs);
                thread::spawn(move || {
                    cache.get_or_init("s", "missed_reason", || {
                        runs.fetch_add(1, Ordering::SeqCst);
                        i
                    })
                })
            })
            .collect();

        let values: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| w[0] == w[1]));
    }
}
