//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may contain any subset of fields and the rest keep their defaults.

use serde::{Deserialize, Serialize};
use shapefeed_core::{SampleRange, SessionMode, WireFormat};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "port": 8000 },
///   "stream": { "intervalMs": 3000, "range": { "min": 0.0, "max": 1.0 } }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedSettings {
    /// Network settings.
    pub server: ServerSettings,
    /// Session and sample settings.
    pub stream: StreamSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl FeedSettings {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.stream
            .range
            .validate()
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
        if self.stream.interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "stream.intervalMs must be positive".into(),
            ));
        }
        if self.server.max_connections == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxConnections must be positive".into(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(SettingsError::InvalidValue("server.host is empty".into()));
        }
        Ok(())
    }
}

/// Network settings for the HTTP/WebSocket listener.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` picks a free port).
    pub port: u16,
    /// Maximum concurrent sessions; further upgrades get `503`.
    pub max_connections: usize,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_connections: 100,
            max_message_size: 64 * 1024,
        }
    }
}

/// Session behavior and sample generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSettings {
    /// Delay between samples in milliseconds.
    pub interval_ms: u64,
    /// Range every channel is drawn from.
    pub range: SampleRange,
    /// Streaming or listen-only sessions.
    pub mode: SessionMode,
    /// Payload encoding.
    pub wire_format: WireFormat,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            interval_ms: 3_000,
            range: SampleRange::CANONICAL,
            mode: SessionMode::Stream,
            wire_format: WireFormat::Object,
        }
    }
}

/// Log verbosity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level (most verbose).
    Trace,
    /// Debug-level.
    Debug,
    /// Info-level (default).
    #[default]
    Info,
    /// Warning-level.
    Warn,
    /// Error-level.
    Error,
}

impl LogLevel {
    /// Convert to a tracing filter string.
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse a level name (case-insensitive, `warning` accepted).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level; `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}
