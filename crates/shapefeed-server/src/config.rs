//! Server and session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shapefeed_core::{SampleGenerator, SessionMode, WireFormat};

/// Listener configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket sessions.
    pub max_connections: usize,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 100,
            max_message_size: 64 * 1024,
        }
    }
}

/// Behavior shared by every session a server spawns.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Delay between consecutive samples.
    pub interval: Duration,
    /// Source of sample values.
    pub generator: SampleGenerator,
    /// Payload encoding.
    pub wire_format: WireFormat,
    /// Streaming or listen-only.
    pub mode: SessionMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            generator: SampleGenerator::default(),
            wire_format: WireFormat::Object,
            mode: SessionMode::Stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefeed_core::SampleRange;

    #[test]
    fn default_server_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.max_connections, 100);
        assert_eq!(cfg.max_message_size, 64 * 1024);
    }

    #[test]
    fn default_session_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.interval, Duration::from_secs(3));
        assert_eq!(cfg.generator.range(), SampleRange::CANONICAL);
        assert_eq!(cfg.wire_format, WireFormat::Object);
        assert_eq!(cfg.mode, SessionMode::Stream);
    }

    #[test]
    fn server_config_serde_roundtrip() {
        let cfg = ServerConfig {
            host: "0.0.0.0".into(),
            port: 8000,
            max_connections: 5,
            max_message_size: 1024,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, "0.0.0.0");
        assert_eq!(back.port, 8000);
        assert_eq!(back.max_connections, 5);
        assert_eq!(back.max_message_size, 1024);
    }
}
