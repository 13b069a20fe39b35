//! Connection Handler Module
//!
//! This module handles individual client connections to Cachet.
//! Each client gets its own handler task that runs in a loop,
//! reading command lines and sending replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Split a line off buffer │◄┼──── read more bytes if none
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Parse + execute command │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Write + flush reply     │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. QUIT / EOF / I/O error / idle timeout / oversized line
//!        │
//!        ▼
//! 5. Handler dropped: stream closed, stats updated
//! ```
//!
//! ## Buffer Management
//!
//! TCP is a stream protocol: one read may carry half a line or several
//! lines. Incoming bytes accumulate in a `BytesMut` and complete lines are
//! split off the front. A final line that ends at end-of-stream without a
//! `\n` is still executed.

use crate::commands::CommandHandler;
use crate::config::ConnectionConfig;
use crate::protocol::{find_lf, parse_bytes, Reply};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Why a connection ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent `QUIT` or `EXIT`
    Quit,
    /// The client closed its side of the stream
    PeerClosed,
}

/// Handles a single client connection.
///
/// This struct manages the read buffer, parsing, and reply sending
/// for one connected client. It is generic over the stream so the same
/// loop serves TCP sockets and in-memory test streams.
///
/// The stream is owned by the handler and closed when the handler is
/// dropped, on every exit path including a panic inside a command.
pub struct ConnectionHandler<S> {
    /// The client stream (writes are buffered, flushed once per reply)
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// The command handler (shares the store with other connections)
    command_handler: CommandHandler,

    /// Per-connection policy
    config: ConnectionConfig,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,

    /// Prefix of `buffer` already searched for `\n`
    scanned: usize,

    /// Set once the peer has closed its write side
    eof: bool,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The client stream
    /// * `addr` - The client's socket address
    /// * `command_handler` - The command handler for executing commands
    /// * `stats` - Shared connection statistics
    /// * `config` - Prompt, idle timeout and line length policy
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
        config: ConnectionConfig,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            config,
            stats,
            scanned: 0,
            eof: false,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Reads commands from the client, executes them, and sends back
    /// replies until the client quits, disconnects, or an error occurs.
    pub async fn run(mut self) -> Result<CloseReason, ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(CloseReason::Quit) => info!(client = %self.addr, "Client quit"),
            Ok(CloseReason::PeerClosed) => info!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        result
    }

    /// The main read-execute-reply loop.
    async fn main_loop(&mut self) -> Result<CloseReason, ConnectionError> {
        self.send_prompt().await?;

        loop {
            loop {
                let line = match self.next_line() {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        // Best effort: the client may not be reading any more.
                        let _ = self.write_bytes(&Reply::error(&e).serialize()).await;
                        return Err(e);
                    }
                };

                if self.process_line(&line).await? {
                    return Ok(CloseReason::Quit);
                }
            }

            if self.eof {
                return Ok(CloseReason::PeerClosed);
            }

            self.read_more_data().await?;
        }
    }

    /// Splits the next complete line (without its `\n`) off the buffer.
    ///
    /// After end-of-stream, whatever remains in the buffer is the last line.
    fn next_line(&mut self) -> Result<Option<BytesMut>, ConnectionError> {
        let max = self.config.max_line_length;

        let found = find_lf(&self.buffer[self.scanned..]).map(|offset| self.scanned + offset);
        self.scanned = match found {
            Some(_) => 0,
            None => self.buffer.len(),
        };

        match found {
            Some(pos) if pos > max => Err(ConnectionError::LineTooLong(max)),
            Some(pos) => {
                let mut line = self.buffer.split_to(pos + 1);
                line.truncate(pos);
                trace!(
                    client = %self.addr,
                    length = pos,
                    remaining = self.buffer.len(),
                    "Split line"
                );
                Ok(Some(line))
            }
            None if self.buffer.len() > max => Err(ConnectionError::LineTooLong(max)),
            None if self.eof && !self.buffer.is_empty() => {
                self.scanned = 0;
                Ok(Some(self.buffer.split()))
            }
            None => Ok(None),
        }
    }

    /// Parses and executes one line, then writes the reply.
    ///
    /// Returns `true` if the connection must close.
    async fn process_line(&mut self, line: &[u8]) -> Result<bool, ConnectionError> {
        let reply = match parse_bytes(line) {
            Ok(Some(command)) => {
                trace!(client = %self.addr, command = command.name(), "Executing command");
                self.command_handler.execute(command)
            }
            Ok(None) => {
                self.send_prompt().await?;
                return Ok(false);
            }
            Err(e) => {
                debug!(client = %self.addr, error = %e, "Rejected command line");
                Reply::error(e)
            }
        };

        self.stats.command_processed();
        self.send_reply(&reply).await?;

        Ok(reply.closes_connection())
    }

    /// Reads more data from the stream into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let idle_timeout = self.config.idle_timeout;
        let read = self.stream.get_mut().read_buf(&mut self.buffer);

        let n = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| ConnectionError::IdleTimeout(limit))??,
            None => read.await?,
        };

        if n == 0 {
            trace!(client = %self.addr, buffered = self.buffer.len(), "End of stream");
            self.eof = true;
            return Ok(());
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Sends a reply, followed by the prompt unless the connection is closing.
    async fn send_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let mut bytes = reply.serialize();
        if !reply.closes_connection() {
            if let Some(prompt) = &self.config.prompt {
                bytes.extend_from_slice(prompt.as_bytes());
            }
        }
        self.write_bytes(&bytes).await
    }

    /// Sends the prompt on its own, if one is configured.
    async fn send_prompt(&mut self) -> Result<(), ConnectionError> {
        if let Some(prompt) = &self.config.prompt {
            self.stream.write_all(prompt.as_bytes()).await?;
            self.stream.flush().await?;
            self.stats.bytes_written(prompt.len());
        }
        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(
            client = %self.addr,
            bytes = bytes.len(),
            "Sent reply"
        );
        Ok(())
    }
}

impl<S> Drop for ConnectionHandler<S> {
    fn drop(&mut self) {
        self.stats.connection_closed();
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No data arrived within the configured idle timeout
    #[error("connection idle for longer than {0:?}")]
    IdleTimeout(Duration),

    /// A command line grew past the configured maximum
    #[error("command line exceeds {0} bytes")]
    LineTooLong(usize),
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion. The stream is closed when it returns.
///
/// # Arguments
///
/// * `stream` - The TCP stream for this connection
/// * `addr` - The client's socket address
/// * `command_handler` - The command handler for executing commands
/// * `stats` - Shared connection statistics
/// * `config` - Per-connection policy
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    config: ConnectionConfig,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(client = %addr, error = %e, "Failed to set TCP_NODELAY");
    }

    let handler = ConnectionHandler::new(stream, addr, command_handler, stats, config);
    // The outcome is logged by `run`
    let _ = handler.run().await;
}
