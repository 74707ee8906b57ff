//! # shapefeed-logging
//!
//! Global `tracing` subscriber setup. Output goes to stderr, either compact
//! text or one JSON object per line. `RUST_LOG` overrides the configured level.
//!
//! Settings are loaded before the level is known, so [`with_bootstrap`] runs
//! that phase under a temporary warn-level stderr subscriber.

#![deny(unsafe_code)]

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line records.
    #[default]
    Compact,
    /// Newline-delimited JSON records.
    Json,
}

impl LogFormat {
    /// `Json` when `json` is set, otherwise `Compact`.
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Build the filter: `RUST_LOG` if set and valid, else `level`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber.
///
/// Returns `false` if a global subscriber was already installed; the existing
/// one is kept.
pub fn init_subscriber(level: &str, format: LogFormat) -> bool {
    let filter = build_filter(level);

    match format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .try_init()
            .is_ok(),
    }
}

/// Run `f` with a scoped compact subscriber on stderr (`RUST_LOG` or `warn`).
pub fn with_bootstrap<T>(f: impl FnOnce() -> T) -> T {
    with_bootstrap_writer(std::io::stderr, f)
}

/// [`with_bootstrap`] with a caller-supplied writer.
pub fn with_bootstrap_writer<W, T>(writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_filter("warn"))
        .with_target(true)
        .with_writer(writer)
        .compact()
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn format_from_flag() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::Compact);
        assert_eq!(LogFormat::default(), LogFormat::Compact);
    }

    #[test]
    fn second_init_is_rejected_without_panic() {
        let _ = init_subscriber("info", LogFormat::Compact);
        assert!(!init_subscriber("debug", LogFormat::Json));
    }

    #[test]
    fn filter_accepts_module_directives() {
        let filter = build_filter("info,shapefeed_server=debug");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn bootstrap_keeps_warnings_and_drops_info() {
        let out = Captured::default();
        let writer = out.clone();
        let value = with_bootstrap_writer(
            move || writer.clone(),
            || {
                tracing::info!("not shown");
                tracing::warn!(key = "SHAPEFEED_PORT", "bad value");
                7
            },
        );
        assert_eq!(value, 7);

        let text = String::from_utf8_lossy(&out.0.lock().unwrap()).into_owned();
        assert!(text.contains("bad value"), "got: {text}");
        assert!(text.contains("SHAPEFEED_PORT"), "got: {text}");
        assert!(!text.contains("not shown"), "got: {text}");
    }
}
