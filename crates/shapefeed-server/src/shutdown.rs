//! Server-wide shutdown.
//!
//! One `CancellationToken` is shared by the listener and every session.
//! Cancelling it stops accepting upgrades, and each live session leaves its
//! loop with `SessionOutcome::Shutdown` at its next suspension point, sends a
//! close frame, and releases its connection slot.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::websocket::connection::ConnectionTracker;

/// How long to wait for the listener and live sessions after cancelling.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the token that stops the listener and every session.
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a coordinator with a fresh token.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token handed to the listener and to each session.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signal shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been signalled.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Signal shutdown, then wait for the listener task to exit and for every
    /// session tracked by `sessions` to release its slot.
    ///
    /// Returns `false` if anything was still running after `timeout`.
    pub async fn graceful_shutdown(
        &self,
        listener: JoinHandle<()>,
        sessions: &ConnectionTracker,
        timeout: Option<Duration>,
    ) -> bool {
        let timeout = timeout.unwrap_or(DEFAULT_DRAIN_TIMEOUT);

        self.shutdown();
        info!(
            live_sessions = sessions.active(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "draining sessions"
        );

        let drain = async {
            if let Err(e) = listener.await {
                warn!(error = %e, "listener task failed");
            }
            sessions.drained().await;
        };

        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!(
                remaining = sessions.active(),
                "shutdown timed out after {timeout:?}"
            );
            return false;
        }
        info!("all sessions closed");
        true
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn initial_state_not_shutting_down() {
        let coord = ShutdownCoordinator::new();
        assert!(!coord.is_shutting_down());
    }

    #[test]
    fn shutdown_cancels_every_token() {
        let coord = ShutdownCoordinator::default();
        let t1 = coord.token();
        let t2 = coord.token();
        coord.shutdown();
        coord.shutdown();
        assert!(coord.is_shutting_down());
        assert!(t1.is_cancelled());
        assert!(t2.is_cancelled());
    }

    #[tokio::test]
    async fn drains_listener_and_sessions() {
        let coord = ShutdownCoordinator::new();
        let tracker = Arc::new(ConnectionTracker::new());

        let listener_token = coord.token();
        let listener = tokio::spawn(async move { listener_token.cancelled().await });

        let mut sessions = Vec::new();
        for _ in 0..3 {
            let guard = tracker.try_acquire(10).unwrap();
            let token = coord.token();
            sessions.push(tokio::spawn(async move {
                token.cancelled().await;
                drop(guard);
            }));
        }
        assert_eq!(tracker.active(), 3);

        assert!(coord.graceful_shutdown(listener, &tracker, None).await);
        assert_eq!(tracker.active(), 0);
        for s in sessions {
            s.await.unwrap();
        }
    }

    #[tokio::test]
    async fn no_live_sessions_finishes_with_listener() {
        let coord = ShutdownCoordinator::new();
        let tracker = ConnectionTracker::new();
        let listener = tokio::spawn(async {});
        assert!(coord.graceful_shutdown(listener, &tracker, None).await);
        assert!(coord.is_shutting_down());
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_session_times_out() {
        let coord = ShutdownCoordinator::new();
        let tracker = Arc::new(ConnectionTracker::new());
        let _stuck = tracker.try_acquire(10).unwrap();
        let listener = tokio::spawn(async {});

        let finished = coord
            .graceful_shutdown(listener, &tracker, Some(Duration::from_millis(100)))
            .await;
        assert!(!finished);
        assert_eq!(tracker.active(), 1);
    }
}
