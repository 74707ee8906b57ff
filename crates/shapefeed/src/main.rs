//! # shapefeed
//!
//! Server binary. Loads settings, installs logging, and serves `/ws` and
//! `/health` until ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use shapefeed_core::{SampleGenerator, SessionMode, WireFormat};
use shapefeed_logging::LogFormat;
use shapefeed_server::{FeedServer, ServerConfig, SessionConfig};
use shapefeed_settings::FeedSettings;

/// Streams random shape samples to WebSocket clients.
#[derive(Parser, Debug)]
#[command(name = "shapefeed", about = "Shape sample WebSocket feed")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Milliseconds between samples (overrides settings).
    #[arg(long)]
    interval_ms: Option<u64>,

    /// `stream` emits samples after the start signal; `listen` only logs
    /// inbound messages.
    #[arg(long)]
    mode: Option<SessionMode>,

    /// Payload encoding: `object` or `encodedString`.
    #[arg(long)]
    wire_format: Option<WireFormat>,

    /// Settings file (defaults to `~/.shapefeed/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Overlay flags that were given on the command line.
    fn apply(&self, settings: &mut FeedSettings) {
        if let Some(ref host) = self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(ms) = self.interval_ms {
            settings.stream.interval_ms = ms;
        }
        if let Some(mode) = self.mode {
            settings.stream.mode = mode;
        }
        if let Some(format) = self.wire_format {
            settings.stream.wire_format = format;
        }
        if self.log_json {
            settings.logging.json = true;
        }
    }
}

fn load(cli: &Cli) -> Result<FeedSettings> {
    let path = cli
        .settings
        .clone()
        .unwrap_or_else(shapefeed_settings::settings_path);
    let mut settings = shapefeed_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    cli.apply(&mut settings);
    settings.validate().context("Invalid command-line override")?;
    Ok(settings)
}

fn server_config(settings: &FeedSettings) -> ServerConfig {
    ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        max_connections: settings.server.max_connections,
        max_message_size: settings.server.max_message_size,
    }
}

fn session_config(settings: &FeedSettings) -> Result<SessionConfig> {
    let generator =
        SampleGenerator::new(settings.stream.range).context("Invalid sample range")?;
    Ok(SessionConfig {
        interval: Duration::from_millis(settings.stream.interval_ms),
        generator,
        wire_format: settings.stream.wire_format,
        mode: settings.stream.mode,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = shapefeed_logging::with_bootstrap(|| load(&cli))?;

    let _ = shapefeed_logging::init_subscriber(
        settings.logging.level.as_filter_str(),
        LogFormat::from_json_flag(settings.logging.json),
    );

    let server = FeedServer::new(server_config(&settings), session_config(&settings)?);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;

    tracing::info!(
        range_min = settings.stream.range.min,
        range_max = settings.stream.range.max,
        wire_format = ?settings.stream.wire_format,
        "serving ws://{addr}/ws"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    let drained = server
        .shutdown()
        .graceful_shutdown(handle, server.connections(), None)
        .await;
    if !drained {
        tracing::warn!("some sessions did not close in time");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefeed_core::SampleRange;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["shapefeed"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn no_flags_leave_settings_untouched() {
        let mut settings = FeedSettings::default();
        cli(&[]).apply(&mut settings);
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.stream.interval_ms, 3000);
        assert_eq!(settings.stream.mode, SessionMode::Stream);
        assert!(!settings.logging.json);
    }

    #[test]
    fn flags_override_settings() {
        let mut settings = FeedSettings::default();
        cli(&[
            "--host",
            "127.0.0.1",
            "--port",
            "9100",
            "--interval-ms",
            "250",
            "--mode",
            "listen",
            "--wire-format",
            "encodedString",
            "--log-json",
        ])
        .apply(&mut settings);

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.stream.interval_ms, 250);
        assert_eq!(settings.stream.mode, SessionMode::Listen);
        assert_eq!(settings.stream.wire_format, WireFormat::EncodedString);
        assert!(settings.logging.json);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = Cli::try_parse_from(["shapefeed", "--mode", "broadcast"]).unwrap_err();
        assert!(err.to_string().contains("broadcast"));
    }

    #[test]
    fn unknown_wire_format_names_the_value() {
        let err = Cli::try_parse_from(["shapefeed", "--wire-format", "xml"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown wire format"), "got: {msg}");
        assert!(!msg.contains("encode sample"), "got: {msg}");
    }

    #[test]
    fn zero_interval_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let args = cli(&[
            "--settings",
            path.to_str().unwrap(),
            "--interval-ms",
            "0",
        ]);
        assert!(load(&args).is_err());
    }

    #[test]
    fn settings_file_feeds_session_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"stream": {"intervalMs": 500, "range": {"min": 0.2, "max": 1.2}}}"#,
        )
        .unwrap();

        let settings = load(&cli(&["--settings", path.to_str().unwrap()])).unwrap();
        let session = session_config(&settings).unwrap();
        assert_eq!(session.interval, Duration::from_millis(500));
        assert_eq!(session.generator.range(), SampleRange::LEGACY);
        assert_eq!(session.mode, SessionMode::Stream);
    }

    #[test]
    fn server_config_mirrors_settings() {
        let settings = FeedSettings::default();
        let config = server_config(&settings);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_connections, settings.server.max_connections);
        assert_eq!(config.max_message_size, settings.server.max_message_size);
    }
}
