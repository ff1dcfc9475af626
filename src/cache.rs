//! Bounded LRU cache for rendered tiles
//!
//! A thin, internally synchronized wrapper around [`lru::LruCache`]. The
//! renderer keys tiles by `(zoom, column, row)` and shares one cache across
//! the render and prefetch threads, so every operation takes the single
//! internal mutex.

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Fixed-capacity least-recently-used cache
///
/// `get` refreshes an entry's recency; `contains` does not. `insert` keeps
/// an existing entry untouched instead of overwriting it, so a tile that is
/// already cached never loses its recency slot to a redundant render.
pub struct TileCache<K, V> {
    inner: Mutex<LruCache<K, V>>,
}

/// Reports occupancy rather than contents; entries may be large tiles
impl<K: Hash + Eq, V> fmt::Debug for TileCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("TileCache")
            .field("len", &inner.len())
            .field("capacity", &inner.cap().get())
            .finish()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<K: Hash + Eq, V: Clone> TileCache<K, V> {
    /// Create a cache holding at most `capacity` entries; a zero capacity
    /// is bumped to one
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Insert a value, evicting the least recently used entry when full
    ///
    /// A no-op when the key is already present: the stored value and its
    /// recency are both left as they were.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.contains(&key) {
            inner.put(key, value);
        }
    }

    /// Clone out the value for `key`, marking the entry as most recently
    /// used
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    /// Whether `key` is cached, without touching its recency
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().unwrap().contains(key)
    }

    /// Remove and return the value for `key`
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().unwrap().pop(key)
    }

    /// Drop every entry, keeping the capacity
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap().cap().get()
    }
}
