//! `GET /ws`: accepts the upgrade and spawns a session on the socket.

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use shapefeed_core::SessionId;
use tracing::warn;

use super::connection::ConnectionGuard;
use super::session::FeedSession;
use crate::config::SessionConfig;
use crate::server::AppState;

/// WebSocket upgrade handler.
///
/// Refuses the upgrade with `503` once `max_connections` sessions are live.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let Some(guard) = state.connections.try_acquire(state.max_connections) else {
        warn!(
            limit = state.max_connections,
            "connection limit reached, refusing upgrade"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "too many connections").into_response();
    };

    let session_config = state.session.clone();
    let cancel = state.shutdown.token();
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, session_config, cancel, guard))
}

/// Run one session on an upgraded socket; the guard frees its slot on return.
async fn handle_socket(
    socket: WebSocket,
    config: SessionConfig,
    cancel: tokio_util::sync::CancellationToken,
    _guard: ConnectionGuard,
) {
    let (tx, rx) = socket.split();
    let mut session = FeedSession::new(SessionId::new(), config, tx, rx, cancel);
    let _ = session.run().await;
}
