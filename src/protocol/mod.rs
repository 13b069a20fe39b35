//! Line Protocol Implementation
//!
//! Cachet speaks a plain-text, newline-delimited protocol: one command per
//! line in, one reply line out.
//!
//! ## Modules
//!
//! - `parser`: Tokenizes a line and validates it against the command table
//! - `types`: Defines the `Reply` enum and its wire serialization
//!
//! ## Example
//!
//! ```
//! use cachet::protocol::{parse_line, Command, Reply};
//!
//! // Parsing incoming data
//! let cmd = parse_line("GET name\n").unwrap();
//! assert_eq!(cmd, Some(Command::Get { key: "name".into() }));
//!
//! // Creating replies
//! let reply = Reply::Value("cachet".into());
//! assert_eq!(reply.serialize(), b"cachet\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{
    find_lf, lookup, parse_bytes, parse_line, tokenize, Command, CommandSpec, ParseError,
    ParseResult, COMMAND_TABLE,
};
pub use types::Reply;
