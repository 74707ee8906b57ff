//! `FeedServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{ServerConfig, SessionConfig};
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::connection::ConnectionTracker;
use crate::websocket::handler::ws_handler;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live session accounting.
    pub connections: Arc<ConnectionTracker>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Settings handed to every new session.
    pub session: SessionConfig,
    /// Upgrades beyond this many live sessions are refused.
    pub max_connections: usize,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
}

/// The shapefeed server.
///
/// Routes are fixed at construction; nothing registers handlers afterwards.
pub struct FeedServer {
    config: ServerConfig,
    session: SessionConfig,
    connections: Arc<ConnectionTracker>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl FeedServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, session: SessionConfig) -> Self {
        Self {
            config,
            session,
            connections: Arc::new(ConnectionTracker::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            connections: self.connections.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            session: self.session.clone(),
            max_connections: self.config.max_connections,
            max_message_size: self.config.max_message_size,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind the listener and serve until shutdown is signalled.
    ///
    /// Returns the bound address and the server task handle.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "server terminated with error");
            }
            info!("server stopped");
        });

        info!(
            %local_addr,
            interval_ms = self.session_interval_ms(),
            mode = %self.session.mode,
            "shapefeed listening"
        );
        Ok((local_addr, handle))
    }

    fn session_interval_ms(&self) -> u64 {
        u64::try_from(self.session.interval.as_millis()).unwrap_or(u64::MAX)
    }

    /// Live session accounting.
    pub fn connections(&self) -> &Arc<ConnectionTracker> {
        &self.connections
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the per-session configuration.
    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.connections.active(),
        state.connections.total(),
    ))
}
