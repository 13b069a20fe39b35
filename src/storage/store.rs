//! The Store Trait
//!
//! Every key-value engine Cachet can serve from implements [`Store`].
//! The command layer only ever talks to `Arc<dyn Store>`, so an alternative
//! engine can be dropped in without touching the protocol or connection code.
//!
//! ## Atomicity Contract
//!
//! Each method is one critical section. In particular `incr_by` and `append`
//! must read, modify and write the value without releasing the engine's lock
//! in between; callers must never emulate them with `get` followed by `set`.

use thiserror::Error;

/// Errors returned by value-typed operations on a store.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The stored value does not parse as a base-10 signed 64-bit integer
    #[error("value is not an integer or out of range")]
    NotAnInteger,

    /// The result of an increment/decrement does not fit in an i64
    #[error("increment or decrement would overflow")]
    Overflow,
}

/// The capability set shared by all key-value engines.
pub trait Store: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it is absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Inserts or overwrites `key` unconditionally.
    fn set(&self, key: &str, value: &str);

    /// Removes `key`. Returns `true` if it was present before the call.
    fn delete(&self, key: &str) -> bool;

    fn exists(&self, key: &str) -> bool;

    /// Returns a snapshot of all keys, in no particular order.
    fn keys(&self) -> Vec<String>;

    /// Number of keys currently stored.
    fn size(&self) -> usize;

    /// Atomically removes every key.
    fn clear(&self);

    /// Adds `delta` to the integer stored under `key` (absent counts as 0)
    /// and returns the new value.
    ///
    /// On error the stored value is left untouched.
    fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StorageError>;

    /// Appends `suffix` to the value under `key` (absent counts as empty)
    /// and returns the resulting length in bytes.
    fn append(&self, key: &str, suffix: &str) -> usize;

    /// Increments the integer stored under `key` by one.
    fn incr(&self, key: &str) -> Result<i64, StorageError> {
        self.incr_by(key, 1)
    }

    /// Decrements the integer stored under `key` by one.
    fn decr(&self, key: &str) -> Result<i64, StorageError> {
        self.incr_by(key, -1)
    }

    /// Length in bytes of the value under `key`, or 0 if absent.
    fn strlen(&self, key: &str) -> usize {
        self.get(key).map(|v| v.len()).unwrap_or(0)
    }
}
