//! Line Protocol Parser
//!
//! This module turns one line of client input into a validated [`Command`].
//!
//! ## How the Parser Works
//!
//! 1. The line is trimmed (this also drops a trailing `\r`).
//! 2. It is split into at most three tokens: the command name, a first
//!    argument, and the remainder of the line after one separator. The
//!    remainder is kept as is, so `SET greeting hello world` stores
//!    `hello world` and `SET greeting  hi` stores ` hi`.
//! 3. The name is looked up case-insensitively in [`COMMAND_TABLE`] and the
//!    argument count is checked against the table's arity.
//!
//! The parser returns either:
//! - `Ok(Some(command))` - a valid command
//! - `Ok(None)` - the line was blank and must be ignored
//! - `Err(ParseError)` - the line must be answered with an `ERROR:` reply

use thiserror::Error;

/// Maximum number of tokens a line is split into (name + two arguments).
pub const MAX_TOKENS: usize = 3;

/// Errors that can occur while parsing a command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The command name is not in the command table
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The command was given the wrong number of arguments
    #[error("wrong number of arguments for '{command}', usage: {usage}")]
    WrongArity {
        command: String,
        usage: &'static str,
    },

    /// The raw line is not valid UTF-8
    #[error("invalid UTF-8 in command line")]
    InvalidUtf8,
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Static description of one command: its names, arity, usage string, and
/// how to build it from already arity-checked arguments.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Canonical (upper-case) name
    pub name: &'static str,
    /// Alternative names accepted for the same command
    pub aliases: &'static [&'static str],
    /// Exact number of arguments after the name
    pub arity: usize,
    /// Usage line shown on arity errors
    pub usage: &'static str,
    /// Builds the command; `args.len()` always equals `arity`
    pub build: fn(&[&str]) -> Command,
}

/// Every command the server understands.
pub const COMMAND_TABLE: &[CommandSpec] = &[
    CommandSpec {
        name: "GET",
        aliases: &[],
        arity: 1,
        usage: "GET key",
        build: |args| Command::Get { key: args[0].to_string() },
    },
    CommandSpec {
        name: "SET",
        aliases: &[],
        arity: 2,
        usage: "SET key value",
        build: |args| Command::Set { key: args[0].to_string(), value: args[1].to_string() },
    },
    CommandSpec {
        name: "DEL",
        aliases: &["DELETE"],
        arity: 1,
        usage: "DEL key",
        build: |args| Command::Del { key: args[0].to_string() },
    },
    CommandSpec {
        name: "EXISTS",
        aliases: &[],
        arity: 1,
        usage: "EXISTS key",
        build: |args| Command::Exists { key: args[0].to_string() },
    },
    CommandSpec { name: "KEYS", aliases: &[], arity: 0, usage: "KEYS", build: |_| Command::Keys },
    CommandSpec { name: "SIZE", aliases: &[], arity: 0, usage: "SIZE", build: |_| Command::Size },
    CommandSpec { name: "CLEAR", aliases: &[], arity: 0, usage: "CLEAR", build: |_| Command::Clear },
    CommandSpec { name: "PING", aliases: &[], arity: 0, usage: "PING", build: |_| Command::Ping },
    CommandSpec {
        name: "INCR",
        aliases: &[],
        arity: 1,
        usage: "INCR key",
        build: |args| Command::Incr { key: args[0].to_string() },
    },
    CommandSpec {
        name: "DECR",
        aliases: &[],
        arity: 1,
        usage: "DECR key",
        build: |args| Command::Decr { key: args[0].to_string() },
    },
    CommandSpec {
        name: "APPEND",
        aliases: &[],
        arity: 2,
        usage: "APPEND key value",
        build: |args| Command::Append { key: args[0].to_string(), value: args[1].to_string() },
    },
    CommandSpec {
        name: "STRLEN",
        aliases: &[],
        arity: 1,
        usage: "STRLEN key",
        build: |args| Command::Strlen { key: args[0].to_string() },
    },
    CommandSpec {
        name: "QUIT",
        aliases: &["EXIT"],
        arity: 0,
        usage: "QUIT",
        build: |_| Command::Quit,
    },
];

/// Looks up a command by name, ignoring ASCII case.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMAND_TABLE.iter().find(|spec| {
        spec.name.eq_ignore_ascii_case(name)
            || spec.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    })
}

/// A parsed, validated client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { key: String },
    Set { key: String, value: String },
    Del { key: String },
    Exists { key: String },
    Keys,
    Size,
    Clear,
    Ping,
    Incr { key: String },
    Decr { key: String },
    Append { key: String, value: String },
    Strlen { key: String },
    Quit,
}

impl Command {
    /// Canonical name of the command, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::Keys => "KEYS",
            Command::Size => "SIZE",
            Command::Clear => "CLEAR",
            Command::Ping => "PING",
            Command::Incr { .. } => "INCR",
            Command::Decr { .. } => "DECR",
            Command::Append { .. } => "APPEND",
            Command::Strlen { .. } => "STRLEN",
            Command::Quit => "QUIT",
        }
    }
}

/// Splits a line into at most [`MAX_TOKENS`] tokens.
///
/// The name and the first argument are separated by runs of whitespace. The
/// last token starts after exactly one separator following the first
/// argument and is kept verbatim, so `SET k  v` yields the value ` v`.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::with_capacity(MAX_TOKENS);
    let mut rest = line.trim();

    while !rest.is_empty() {
        if tokens.len() == MAX_TOKENS - 1 {
            tokens.push(rest);
            break;
        }
        match rest.split_once(char::is_whitespace) {
            Some((token, tail)) => {
                tokens.push(token);
                rest = if tokens.len() == MAX_TOKENS - 1 {
                    tail
                } else {
                    tail.trim_start()
                };
            }
            None => {
                tokens.push(rest);
                break;
            }
        }
    }

    tokens
}

/// Parses one line of text into a command.
///
/// # Example
///
/// ```
/// use cachet::protocol::{parse_line, Command};
///
/// let cmd = parse_line("set greeting hello world\n").unwrap();
/// assert_eq!(
///     cmd,
///     Some(Command::Set { key: "greeting".into(), value: "hello world".into() })
/// );
/// assert_eq!(parse_line("   \r\n").unwrap(), None);
/// ```
pub fn parse_line(line: &str) -> ParseResult<Option<Command>> {
    let tokens = tokenize(line);

    let (name, args) = match tokens.split_first() {
        Some((name, args)) => (*name, args),
        None => return Ok(None),
    };

    let spec = lookup(name).ok_or_else(|| ParseError::UnknownCommand(name.to_string()))?;

    if args.len() != spec.arity {
        return Err(ParseError::WrongArity {
            command: name.to_ascii_uppercase(),
            usage: spec.usage,
        });
    }

    let command = (spec.build)(args);

    Ok(Some(command))
}

/// Parses one raw line (without its `\n`) read from the network.
pub fn parse_bytes(line: &[u8]) -> ParseResult<Option<Command>> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidUtf8)?;
    parse_line(line)
}

/// Finds the position of the next `\n` in the buffer.
#[inline]
pub fn find_lf(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}
