//! # trivia-server
//!
//! Trivia game server binary — builds the engine, binds the WebSocket
//! listener, and serves until interrupted.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trivia_server::config::ServerConfig;
use trivia_server::server::TriviaServer;

/// Trivia game server.
#[derive(Parser, Debug)]
#[command(name = "trivia-server", about = "WebSocket server for live trivia sessions")]
struct Cli {
    /// Host to bind.
    #[arg(long, env = "TRIVIA_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, env = "TRIVIA_PORT", default_value = "8080")]
    port: u16,

    /// Seconds each question stays open.
    #[arg(long, env = "TRIVIA_QUESTION_SECS", default_value = "60")]
    question_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        question_secs: args.question_secs,
        ..ServerConfig::default()
    };

    let server = TriviaServer::new(config);
    let (addr, handle) = server.listen().await.context("failed to start server")?;
    tracing::info!("trivia server listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    tracing::info!("shutting down");
    server.shutdown().shutdown();
    let _ = handle.await;
    Ok(())
}
