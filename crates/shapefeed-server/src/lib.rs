//! # shapefeed-server
//!
//! Axum HTTP + `WebSocket` server that pushes random shape samples.
//!
//! - `GET /ws`: one session per connection; the first inbound message starts
//!   a fixed-cadence stream of samples
//! - `GET /health`: liveness and live session count
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::{ServerConfig, SessionConfig};
pub use server::FeedServer;
pub use websocket::session::{FeedSession, SessionOutcome};
