//! Storage Engine Module
//!
//! This module provides the core storage functionality for Cachet:
//! the [`Store`] trait every engine implements, and [`StorageEngine`],
//! the in-memory implementation the server runs with.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   trait Store                               │
//! │   get / set / delete / exists / keys / size / clear         │
//! │   incr_by / append (atomic read-modify-write)               │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │ implemented by
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │             RwLock<HashMap<String, String>>                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use cachet::storage::{StorageEngine, Store};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(StorageEngine::new());
//!
//! engine.set("name", "cachet");
//! assert_eq!(engine.get("name"), Some("cachet".to_string()));
//! assert!(engine.delete("name"));
//! assert_eq!(engine.size(), 0);
//! ```

pub mod engine;
pub mod store;

// Re-export commonly used types
pub use engine::{StorageEngine, StorageStats};
pub use store::{StorageError, Store};
