//! Thread-Safe Storage Engine
//!
//! This module implements the core storage engine for Cachet: a single
//! `HashMap<String, String>` guarded by a readers-writer lock.
//!
//! ## Design Decisions
//!
//! 1. **One lock**: `clear` and `keys` have to observe the whole map at one
//!    instant, so the map is not split into shards. No operation ever needs
//!    more than this one lock, which rules out lock-ordering deadlocks.
//! 2. **RwLock**: Reads (`get`, `exists`, `keys`, `size`, `strlen`) run
//!    concurrently; every mutation has exclusive access for its duration.
//! 3. **Compound ops in the engine**: `incr_by` and `append` do their
//!    read-modify-write under one write guard.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │                                                             │
//! │   readers ──┐                                               │
//! │   readers ──┼──> RwLock<HashMap<String, String>>            │
//! │   writer  ──┘    (one writer XOR many readers)              │
//! │                                                             │
//! │   AtomicU64 counters (relaxed, statistics only)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::storage::store::{StorageError, Store};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The main storage engine for Cachet.
///
/// # Thread Safety
///
/// This struct is designed to be wrapped in an `Arc` and shared across
/// all client handler tasks. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use cachet::storage::{StorageEngine, Store};
///
/// let engine = StorageEngine::new();
///
/// engine.set("name", "cachet");
/// assert_eq!(engine.get("name"), Some("cachet".to_string()));
///
/// assert_eq!(engine.incr("hits"), Ok(1));
/// assert_eq!(engine.append("name", "!"), 7);
/// ```
pub struct StorageEngine {
    /// The key-value data
    data: RwLock<HashMap<String, String>>,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: total write operations (SET, INCR/DECR, APPEND)
    set_count: AtomicU64,

    /// Statistics: total DEL operations
    del_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("keys", &self.size())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .field("del_count", &self.del_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates a new, empty storage engine.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
        }
    }

    /// Acquires the shared read guard.
    ///
    /// A poisoned lock is recovered: every critical section is a single map
    /// operation, so a panicking holder cannot leave the map half-written.
    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the exclusive write guard (see [`Self::read`] on poisoning).
    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if the database holds no keys.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns database statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.size() as u64,
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
        }
    }
}

impl Store for StorageEngine {
    fn get(&self, key: &str) -> Option<String> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        self.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.set_count.fetch_add(1, Ordering::Relaxed);
        self.write().insert(key.to_string(), value.to_string());
    }

    fn delete(&self, key: &str) -> bool {
        self.del_count.fetch_add(1, Ordering::Relaxed);
        self.write().remove(key).is_some()
    }

    fn exists(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn size(&self) -> usize {
        self.read().len()
    }

    fn clear(&self) {
        // Swap in a fresh map so the old allocation is freed outside the guard.
        let old = std::mem::take(&mut *self.write());
        drop(old);
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StorageError> {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.write();

        let current = match data.get(key) {
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| StorageError::NotAnInteger)?,
            None => 0,
        };

        let new_value = current.checked_add(delta).ok_or(StorageError::Overflow)?;
        data.insert(key.to_string(), new_value.to_string());

        Ok(new_value)
    }

    fn append(&self, key: &str, suffix: &str) -> usize {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.write();
        match data.get_mut(key) {
            Some(value) => {
                value.push_str(suffix);
                value.len()
            }
            None => {
                data.insert(key.to_string(), suffix.to_string());
                suffix.len()
            }
        }
    }

    fn strlen(&self, key: &str) -> usize {
        self.read().get(key).map(String::len).unwrap_or(0)
    }
}

/// Database statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keys currently stored
    pub keys: u64,
    /// Total GET operations
    pub get_ops: u64,
    /// Total write operations
    pub set_ops: u64,
    /// Total DEL operations
    pub del_ops: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::new();

        engine.set("key", "value");
        assert_eq!(engine.get("key"), Some("value".to_string()));
    }

    #[test]
    fn test_set_overwrites() {
        let engine = StorageEngine::new();

        engine.set("key", "one");
        engine.set("key", "two");
        assert_eq!(engine.get("key"), Some("two".to_string()));
        assert_eq!(engine.size(), 1);
    }

    #[test]
    fn test_empty_value_is_stored() {
        let engine = StorageEngine::new();

        engine.set("key", "");
        assert_eq!(engine.get("key"), Some(String::new()));
        assert!(engine.exists("key"));
        assert_eq!(engine.strlen("key"), 0);
    }

    #[test]
    fn test_get_nonexistent() {
        let engine = StorageEngine::new();
        assert_eq!(engine.get("nonexistent"), None);
    }

    #[test]
    fn test_delete() {
        let engine = StorageEngine::new();

        engine.set("key", "value");
        assert!(engine.delete("key"));
        assert_eq!(engine.get("key"), None);
        assert!(!engine.exists("key"));
        assert!(!engine.delete("key")); // Already deleted
    }

    #[test]
    fn test_exists() {
        let engine = StorageEngine::new();

        assert!(!engine.exists("key"));
        engine.set("key", "value");
        assert!(engine.exists("key"));
    }

    #[test]
    fn test_keys_snapshot() {
        let engine = StorageEngine::new();

        engine.set("a", "1");
        engine.set("b", "2");
        engine.set("c", "3");

        let mut keys = engine.keys();
        // The snapshot is detached from the engine.
        engine.clear();

        keys.sort();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(engine.keys().is_empty());
    }

    #[test]
    fn test_clear() {
        let engine = StorageEngine::new();

        engine.set("key1", "value1");
        engine.set("key2", "value2");
        assert_eq!(engine.size(), 2);

        engine.clear();

        assert_eq!(engine.size(), 0);
        assert!(engine.is_empty());
        assert!(engine.keys().is_empty());
        assert_eq!(engine.get("key1"), None);
    }

    #[test]
    fn test_incr_decr() {
        let engine = StorageEngine::new();

        // Absent key counts as zero
        assert_eq!(engine.incr("counter"), Ok(1));
        assert_eq!(engine.get("counter"), Some("1".to_string()));
        assert_eq!(engine.incr("counter"), Ok(2));
        assert_eq!(engine.decr("counter"), Ok(1));

        assert_eq!(engine.decr("fresh"), Ok(-1));
        assert_eq!(engine.get("fresh"), Some("-1".to_string()));

        engine.set("num", "10");
        assert_eq!(engine.incr("num"), Ok(11));
    }

    #[test]
    fn test_incr_non_integer_leaves_value() {
        let engine = StorageEngine::new();

        engine.set("text", "abc");
        assert_eq!(engine.incr("text"), Err(StorageError::NotAnInteger));
        assert_eq!(engine.decr("text"), Err(StorageError::NotAnInteger));
        assert_eq!(engine.get("text"), Some("abc".to_string()));

        engine.set("padded", " 5");
        assert_eq!(engine.incr("padded"), Err(StorageError::NotAnInteger));
    }

    #[test]
    fn test_incr_overflow_leaves_value() {
        let engine = StorageEngine::new();

        engine.set("max", &i64::MAX.to_string());
        assert_eq!(engine.incr("max"), Err(StorageError::Overflow));
        assert_eq!(engine.get("max"), Some(i64::MAX.to_string()));

        engine.set("min", &i64::MIN.to_string());
        assert_eq!(engine.decr("min"), Err(StorageError::Overflow));
        assert_eq!(engine.get("min"), Some(i64::MIN.to_string()));
    }

    #[test]
    fn test_append() {
        let engine = StorageEngine::new();

        // Append to non-existent key behaves like SET
        assert_eq!(engine.append("key", "Hello"), 5);
        assert_eq!(engine.get("key"), Some("Hello".to_string()));

        // Append to existing key
        assert_eq!(engine.append("key", " World"), 11);
        assert_eq!(engine.get("key"), Some("Hello World".to_string()));
        assert_eq!(engine.strlen("key"), 11);
    }

    #[test]
    fn test_strlen() {
        let engine = StorageEngine::new();

        assert_eq!(engine.strlen("missing"), 0);
        engine.set("key", "four");
        assert_eq!(engine.strlen("key"), 4);
    }

    #[test]
    fn test_stats() {
        let engine = StorageEngine::new();

        engine.set("a", "1");
        engine.get("a");
        engine.get("b");
        engine.delete("a");

        let stats = engine.stats();
        assert_eq!(stats.keys, 0);
        assert_eq!(stats.get_ops, 2);
        assert_eq!(stats.set_ops, 1);
        assert_eq!(stats.del_ops, 1);
    }

    #[test]
    fn test_concurrent_access() {
        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        // Spawn multiple writers
        for i in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    engine.set(&key, "value");
                    assert!(engine.get(&key).is_some());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.size(), 1000);
    }

    #[test]
    fn test_concurrent_incr_is_exact() {
        const THREADS: usize = 8;
        const ITERATIONS: usize = 1000;

        let engine = Arc::new(StorageEngine::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for _ in 0..ITERATIONS {
                        engine.incr("counter").unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            engine.get("counter"),
            Some((THREADS * ITERATIONS).to_string())
        );
    }

    #[test]
    fn test_concurrent_append_is_exact() {
        let engine = Arc::new(StorageEngine::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for _ in 0..250 {
                        engine.append("log", "x");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.strlen("log"), 1000);
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let engine = Arc::new(StorageEngine::new());
        engine.set("key", "value");

        let poisoner = Arc::clone(&engine);
        let result = thread::spawn(move || {
            let _guard = poisoner.data.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());

        assert_eq!(engine.get("key"), Some("value".to_string()));
        engine.set("other", "1");
        assert_eq!(engine.size(), 2);
    }
}
