//! `TriviaServer` — Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use trivia_engine::broadcast::Transport;
use trivia_engine::engine::{Engine, EngineConfig};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::transport::ConnectionTable;
use crate::ws;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The session engine.
    pub engine: Arc<Engine>,
    /// Connection table backing the engine's transport.
    pub table: Arc<ConnectionTable>,
    /// Per-connection outbound buffer size.
    pub send_buffer: usize,
    /// When the server started.
    pub start_time: Instant,
}

/// The trivia game server.
pub struct TriviaServer {
    config: ServerConfig,
    engine: Arc<Engine>,
    table: Arc<ConnectionTable>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl TriviaServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        let table = Arc::new(ConnectionTable::new());
        let engine = Engine::new(
            Arc::clone(&table) as Arc<dyn Transport>,
            EngineConfig {
                question_secs: config.question_secs,
                ..EngineConfig::default()
            },
        );
        Self {
            config,
            engine,
            table,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            engine: self.engine.clone(),
            table: self.table.clone(),
            send_buffer: self.config.send_buffer,
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws::ws_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the listener and serve until shutdown.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind(format!("{}:{}", self.config.host, self.config.port))
                .await
                .context("failed to bind listener")?;
        let addr = listener.local_addr().context("no local address")?;
        let app = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(error) = result {
                warn!(%error, "server exited with error");
            }
        });
        Ok((addr, handle))
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the session engine.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(
        state.start_time,
        state.table.connection_count(),
        state.engine.game_count(),
    );
    Json(resp)
}
