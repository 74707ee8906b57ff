//! WebSocket upgrade, connection accounting, and the per-connection session loop.

pub mod connection;
pub mod handler;
pub mod session;
