//! # Cachet - A Small In-Memory Key-Value Server
//!
//! Cachet keeps string keys and values in memory and serves them over a
//! plain-text, line-based TCP protocol. Every connection runs in its own
//! task, and all connections share one storage engine.
//!
//! ## Features
//!
//! - **Text protocol**: one command per line, one reply line back
//! - **Linearizable keys**: every engine operation is a single critical section
//! - **Atomic counters**: `INCR`/`DECR`/`APPEND` never lose updates
//! - **Async I/O**: Built on Tokio, one task per client
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Cachet                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │                     ┌─────────────┐    ┌──────────────────────────────┐ │
//! │                     │ Line Parser │    │  Store (trait)               │ │
//! │                     │  + Replies  │    │   └─ StorageEngine           │ │
//! │                     └─────────────┘    │      RwLock<HashMap>         │ │
//! │                                        └──────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use cachet::commands::CommandHandler;
//! use cachet::config::ConnectionConfig;
//! use cachet::connection::{handle_connection, ConnectionStats};
//! use cachet::storage::StorageEngine;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(StorageEngine::new());
//!     let stats = Arc::new(ConnectionStats::new());
//!     let listener = TcpListener::bind("127.0.0.1:6380").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(storage.clone());
//!         let stats = Arc::clone(&stats);
//!
//!         tokio::spawn(handle_connection(stream, addr, handler, stats, ConnectionConfig::default()));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value` / `GET key`
//! - `DEL key` (alias `DELETE`) / `EXISTS key`
//! - `INCR key` / `DECR key`
//! - `APPEND key value` / `STRLEN key`
//! - `KEYS` / `SIZE` / `CLEAR`
//! - `PING`
//! - `QUIT` (alias `EXIT`)
//!
//! ## Module Overview
//!
//! - [`protocol`]: Line parser, command table and reply types
//! - [`storage`]: The `Store` trait and the in-memory engine
//! - [`commands`]: Executes commands against a store
//! - [`connection`]: Client connection management
//! - [`config`]: Per-connection policy (prompt, idle timeout, line limit)

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::ConnectionConfig;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{parse_line, Command, ParseError, Reply};
pub use storage::{StorageEngine, StorageError, Store};

/// The default port Cachet listens on
pub const DEFAULT_PORT: u16 = 6380;

/// The default host Cachet binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of Cachet
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
