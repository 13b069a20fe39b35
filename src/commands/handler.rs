//! Command Handler Module
//!
//! This module executes parsed commands against the store and builds the
//! reply for each one.
//!
//! ## Supported Commands
//!
//! - `GET key` - Get a key's value, or `(nil)`
//! - `SET key value` - Set a key (value may contain spaces)
//! - `DEL key` / `DELETE key` - Delete a key, replies `1` or `0`
//! - `EXISTS key` - Check if a key exists, replies `1` or `0`
//! - `KEYS` - List all keys
//! - `SIZE` - Number of keys
//! - `CLEAR` - Remove every key
//! - `PING` - Test connection
//! - `INCR key` / `DECR key` - Add or subtract one
//! - `APPEND key value` - Append to a string, replies the new length
//! - `STRLEN key` - Length of a value
//! - `QUIT` / `EXIT` - Say goodbye and close the connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ parse_line()│───>│  execute()  │───>│   Reply     │     │
//! │  └─────────────┘    └──────┬──────┘    └─────────────┘     │
//! │                            │                                │
//! │                            ▼                                │
//! │                     Arc<dyn Store>                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::protocol::{parse_line, Command, Reply};
use crate::storage::Store;
use std::sync::Arc;

/// Executes commands against a shared store.
///
/// Cloning is cheap: every clone refers to the same store.
#[derive(Clone)]
pub struct CommandHandler {
    /// The storage engine
    storage: Arc<dyn Store>,
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("keys", &self.storage.size())
            .finish()
    }
}

impl CommandHandler {
    /// Creates a new command handler over the given store.
    pub fn new(storage: Arc<dyn Store>) -> Self {
        Self { storage }
    }

    /// Parses and executes one line of input.
    ///
    /// Returns `None` for a blank line, which gets no reply.
    pub fn execute_line(&self, line: &str) -> Option<Reply> {
        match parse_line(line) {
            Ok(Some(command)) => Some(self.execute(command)),
            Ok(None) => None,
            Err(e) => Some(Reply::error(e)),
        }
    }

    /// Executes a command and returns the reply.
    ///
    /// Each command maps to exactly one store operation.
    pub fn execute(&self, command: Command) -> Reply {
        match command {
            Command::Get { key } => self.cmd_get(&key),
            Command::Set { key, value } => self.cmd_set(&key, &value),
            Command::Del { key } => Reply::flag(self.storage.delete(&key)),
            Command::Exists { key } => Reply::flag(self.storage.exists(&key)),
            Command::Keys => Reply::Keys(self.storage.keys()),
            Command::Size => Reply::count(self.storage.size()),
            Command::Clear => self.cmd_clear(),
            Command::Ping => Reply::Pong,
            Command::Incr { key } => self.cmd_incr_by(&key, 1),
            Command::Decr { key } => self.cmd_incr_by(&key, -1),
            Command::Append { key, value } => Reply::count(self.storage.append(&key, &value)),
            Command::Strlen { key } => Reply::count(self.storage.strlen(&key)),
            Command::Quit => Reply::Goodbye,
        }
    }

    /// GET key
    fn cmd_get(&self, key: &str) -> Reply {
        match self.storage.get(key) {
            Some(value) => Reply::Value(value),
            None => Reply::Nil,
        }
    }

    /// SET key value
    fn cmd_set(&self, key: &str, value: &str) -> Reply {
        self.storage.set(key, value);
        Reply::Ok
    }

    /// CLEAR
    fn cmd_clear(&self) -> Reply {
        self.storage.clear();
        Reply::Ok
    }

    /// INCR key / DECR key
    fn cmd_incr_by(&self, key: &str, delta: i64) -> Reply {
        match self.storage.incr_by(key, delta) {
            Ok(n) => Reply::integer(n),
            Err(e) => Reply::error(e),
        }
    }
}
