//! WebSocket session lifecycle, one connected client from upgrade through
//! disconnect.
//!
//! In stream mode a session:
//! 1. waits for the first inbound data frame (the start signal, content ignored)
//! 2. sends one sample, then sleeps for the configured interval, forever
//! 3. ends on close, transport error, encode error, or server shutdown
//!
//! The session owns both socket halves. It is generic over them so the loop
//! can be driven by in-memory channels in tests.

use std::fmt;
use std::time::{Duration, Instant};

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shapefeed_core::{SessionId, SessionMode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::SessionConfig;

/// Upper bound on sending the close frame during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Terminal status of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The client closed the connection or the stream ended.
    Closed,
    /// Reading from or writing to the socket failed.
    TransportError(String),
    /// A sample could not be encoded.
    SerializationError(String),
    /// The server is shutting down.
    Shutdown,
}

impl SessionOutcome {
    /// Whether the session ended because something failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::TransportError(_) | Self::SerializationError(_))
    }

    /// Short classification string for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::TransportError(_) => "transport_error",
            Self::SerializationError(_) => "serialization_error",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("connection closed"),
            Self::TransportError(e) => write!(f, "transport error: {e}"),
            Self::SerializationError(e) => write!(f, "serialization error: {e}"),
            Self::Shutdown => f.write_str("server shutting down"),
        }
    }
}

/// How an inbound frame affects the session.
enum Inbound {
    /// A data frame; its content is never interpreted.
    Data(String),
    /// Ping/Pong or undecodable binary.
    Control,
    /// Close frame.
    Close,
}

fn classify(msg: Message) -> Inbound {
    match msg {
        Message::Text(text) => Inbound::Data(text.as_str().to_owned()),
        Message::Binary(data) => match std::str::from_utf8(&data) {
            Ok(s) => Inbound::Data(s.to_owned()),
            Err(_) => {
                debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                Inbound::Control
            }
        },
        Message::Ping(_) | Message::Pong(_) => Inbound::Control,
        Message::Close(_) => Inbound::Close,
    }
}

/// One client connection's session.
pub struct FeedSession<Tx, Rx> {
    id: SessionId,
    config: SessionConfig,
    tx: Tx,
    rx: Rx,
    rng: StdRng,
    cancel: CancellationToken,
    started: bool,
    emitted: u64,
}

impl<Tx, Rx, E> FeedSession<Tx, Rx>
where
    Tx: Sink<Message> + Unpin,
    <Tx as Sink<Message>>::Error: fmt::Display,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    /// Create a session over the two halves of an accepted socket.
    pub fn new(
        id: SessionId,
        config: SessionConfig,
        tx: Tx,
        rx: Rx,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            config,
            tx,
            rx,
            rng: StdRng::from_os_rng(),
            cancel,
            started: false,
            emitted: 0,
        }
    }

    /// Replace the entropy-seeded RNG.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Whether the start signal has been received.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Samples sent so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Drive the session to completion and release the socket.
    #[instrument(skip_all, fields(session_id = %self.id, mode = %self.config.mode))]
    pub async fn run(&mut self) -> SessionOutcome {
        let started_at = Instant::now();
        info!("session accepted");

        let outcome = match self.config.mode {
            SessionMode::Stream => match self.await_start_signal().await {
                Ok(()) => self.emission_cycle().await,
                Err(outcome) => outcome,
            },
            SessionMode::Listen => self.listen().await,
        };

        let duration_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        if outcome.is_error() {
            warn!(
                outcome = outcome.kind(),
                error = %outcome,
                emitted = self.emitted,
                duration_ms,
                "session ended with error"
            );
        } else {
            info!(
                outcome = outcome.kind(),
                emitted = self.emitted,
                duration_ms,
                "session ended"
            );
        }

        if tokio::time::timeout(CLOSE_TIMEOUT, self.tx.close()).await.is_err() {
            debug!("timed out sending close frame");
        }
        outcome
    }

    /// Suspend until the first inbound data frame arrives.
    ///
    /// Ping/Pong frames are skipped. Returns the terminal outcome if the
    /// connection ends first.
    pub async fn await_start_signal(&mut self) -> Result<(), SessionOutcome> {
        loop {
            let next = tokio::select! {
                () = self.cancel.cancelled() => return Err(SessionOutcome::Shutdown),
                next = self.rx.next() => next,
            };
            match next {
                None => return Err(SessionOutcome::Closed),
                Some(Err(e)) => return Err(SessionOutcome::TransportError(e.to_string())),
                Some(Ok(msg)) => match classify(msg) {
                    Inbound::Data(text) => {
                        self.started = true;
                        debug!(len = text.len(), "start signal received");
                        return Ok(());
                    }
                    Inbound::Close => return Err(SessionOutcome::Closed),
                    Inbound::Control => {}
                },
            }
        }
    }

    /// Send a sample, sleep for the interval, repeat until a terminal outcome.
    ///
    /// The inbound half is polled during the sleep so a close is seen
    /// promptly; further data frames are ignored.
    pub async fn emission_cycle(&mut self) -> SessionOutcome {
        loop {
            let sample = self.config.generator.sample(&mut self.rng);
            let payload = match self.config.wire_format.encode(&sample) {
                Ok(payload) => payload,
                Err(e) => return SessionOutcome::SerializationError(e.to_string()),
            };

            tokio::select! {
                () = self.cancel.cancelled() => return SessionOutcome::Shutdown,
                sent = self.tx.send(Message::Text(payload.into())) => {
                    if let Err(e) = sent {
                        return SessionOutcome::TransportError(e.to_string());
                    }
                }
            }
            self.emitted += 1;
            trace!(seq = self.emitted, ?sample, "sample sent");

            let sleep = tokio::time::sleep(self.config.interval);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    () = &mut sleep => break,
                    () = self.cancel.cancelled() => return SessionOutcome::Shutdown,
                    next = self.rx.next() => match next {
                        None => return SessionOutcome::Closed,
                        Some(Err(e)) => return SessionOutcome::TransportError(e.to_string()),
                        Some(Ok(msg)) => {
                            if let Inbound::Close = classify(msg) {
                                return SessionOutcome::Closed;
                            }
                        }
                    },
                }
            }
        }
    }

    /// Listen-only mode: log inbound text until the connection ends.
    pub async fn listen(&mut self) -> SessionOutcome {
        loop {
            let next = tokio::select! {
                () = self.cancel.cancelled() => return SessionOutcome::Shutdown,
                next = self.rx.next() => next,
            };
            match next {
                None => return SessionOutcome::Closed,
                Some(Err(e)) => return SessionOutcome::TransportError(e.to_string()),
                Some(Ok(msg)) => match classify(msg) {
                    Inbound::Data(text) => {
                        info!(len = text.len(), text = %text, "message received");
                    }
                    Inbound::Close => return SessionOutcome::Closed,
                    Inbound::Control => {}
                },
            }
        }
    }
}
