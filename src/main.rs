//! Cachet - A Small In-Memory Key-Value Server
//!
//! This is the main entry point for the Cachet server.
//! It sets up the TCP listener and storage engine, and hands every
//! accepted connection to its own handler task.

use cachet::commands::CommandHandler;
use cachet::config::{ConnectionConfig, DEFAULT_MAX_LINE_LENGTH, DEFAULT_PROMPT};
use cachet::connection::{handle_connection, ConnectionStats};
use cachet::storage::StorageEngine;
use clap::Parser;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Cachet server
#[derive(Parser, Debug)]
#[command(name = "cachet")]
#[command(about = "A small in-memory key-value server with a line-based text protocol")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = cachet::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = cachet::DEFAULT_PORT)]
    port: u16,

    /// Write a "> " prompt before every command (interactive clients)
    #[arg(long)]
    prompt: bool,

    /// Close connections idle for this many seconds (default: never)
    #[arg(long, value_name = "SECS")]
    idle_timeout: Option<u64>,

    /// Longest accepted command line, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,
}

impl Args {
    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the per-connection policy from the flags
    fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::default().with_max_line_length(self.max_line_length);
        if self.prompt {
            config = config.with_prompt(DEFAULT_PROMPT);
        }
        if let Some(secs) = self.idle_timeout {
            config = config.with_idle_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Cachet v{}", cachet::VERSION);

    // Create the storage engine (shared across all connections)
    let storage = Arc::new(StorageEngine::new());
    let stats = Arc::new(ConnectionStats::new());
    let config = args.connection_config();

    // Bind the TCP listener
    let listener = TcpListener::bind(args.bind_address()).await?;
    info!("Listening on {}", args.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, Arc::clone(&storage), Arc::clone(&stats), config) => {}
        _ = shutdown => {}
    }

    let storage_stats = storage.stats();
    info!(
        keys = storage_stats.keys,
        get_ops = storage_stats.get_ops,
        set_ops = storage_stats.set_ops,
        del_ops = storage_stats.del_ops,
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
    config: ConnectionConfig,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                // Create a command handler for this connection
                let handler = CommandHandler::new(storage.clone());
                let stats = Arc::clone(&stats);
                let config = config.clone();

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats, config).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
