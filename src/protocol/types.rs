//! Reply Types
//!
//! This module defines the replies Cachet sends back to clients.
//! Every reply is a single line of text terminated by `\n`.
//!
//! ## Wire Format
//!
//! ```text
//! OK                      SET, CLEAR
//! PONG                    PING
//! bar                     GET (stored value)
//! (nil)                   GET (absent key)
//! 1                       DEL, EXISTS, INCR, DECR, APPEND, STRLEN, SIZE
//! [a, b, c]               KEYS
//! (empty list)            KEYS (no keys)
//! ERROR: <reason>         any failed command
//! Goodbye!                EXIT, QUIT (connection closes afterwards)
//! ```

use std::fmt;

/// The line terminator used for every reply
pub const LF: &[u8] = b"\n";

/// Prefix that starts every error reply
pub const ERROR_PREFIX: &str = "ERROR: ";

/// A single reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `OK`
    Ok,

    /// `PONG`
    Pong,

    /// A stored value, written verbatim.
    Value(String),

    /// `(nil)` for an absent key
    Nil,

    /// A decimal integer.
    Integer(i64),

    /// A key listing: `[a, b]`, or `(empty list)` when empty.
    Keys(Vec<String>),

    /// `ERROR: <reason>`
    Error(String),

    /// `Goodbye!`; the connection is closed after it is written.
    Goodbye,
}

impl Reply {
    /// Creates an error reply.
    ///
    /// # Example
    /// ```
    /// use cachet::protocol::Reply;
    /// let err = Reply::error("unknown command 'BOGUS'");
    /// assert_eq!(err.serialize(), b"ERROR: unknown command 'BOGUS'\n");
    /// ```
    pub fn error(reason: impl fmt::Display) -> Self {
        Reply::Error(reason.to_string())
    }

    /// Creates an integer reply.
    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Creates a `1`/`0` reply from a boolean.
    pub fn flag(b: bool) -> Self {
        Reply::Integer(i64::from(b))
    }

    /// Creates an integer reply from a length or count.
    pub fn count(n: usize) -> Self {
        Reply::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Serializes the reply to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Ok => buf.extend_from_slice(b"OK"),
            Reply::Pong => buf.extend_from_slice(b"PONG"),
            Reply::Value(s) => buf.extend_from_slice(s.as_bytes()),
            Reply::Nil => buf.extend_from_slice(b"(nil)"),
            Reply::Integer(n) => buf.extend_from_slice(n.to_string().as_bytes()),
            Reply::Keys(keys) if keys.is_empty() => buf.extend_from_slice(b"(empty list)"),
            Reply::Keys(keys) => {
                buf.push(b'[');
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        buf.extend_from_slice(b", ");
                    }
                    buf.extend_from_slice(key.as_bytes());
                }
                buf.push(b']');
            }
            Reply::Error(reason) => {
                buf.extend_from_slice(ERROR_PREFIX.as_bytes());
                buf.extend_from_slice(reason.as_bytes());
            }
            Reply::Goodbye => buf.extend_from_slice(b"Goodbye!"),
        }
        buf.extend_from_slice(LF);
    }

    /// Returns true if this reply is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Returns true if the connection must close after this reply.
    pub fn closes_connection(&self) -> bool {
        matches!(self, Reply::Goodbye)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = self.serialize();
        line.pop();
        f.write_str(&String::from_utf8_lossy(&line))
    }
}
