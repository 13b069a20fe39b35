//! Connection Configuration
//!
//! Per-connection policy shared by every handler the server spawns.

use std::time::Duration;

/// Prompt written by interactive servers before each command
pub const DEFAULT_PROMPT: &str = "> ";

/// Longest command line accepted before the connection is dropped (1 MiB)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Policy applied to each client connection.
///
/// # Example
///
/// ```
/// use cachet::config::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig::default()
///     .with_prompt("> ")
///     .with_idle_timeout(Duration::from_secs(300));
///
/// assert_eq!(config.prompt.as_deref(), Some("> "));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Text written before each command is read (`None` = no prompt)
    pub prompt: Option<String>,

    /// Close a connection that sends nothing for this long (`None` = never)
    pub idle_timeout: Option<Duration>,

    /// Maximum length of a single command line, in bytes
    pub max_line_length: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            prompt: None,
            idle_timeout: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ConnectionConfig {
    /// Set the prompt written before each command
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set the maximum command line length (in bytes)
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }
}
