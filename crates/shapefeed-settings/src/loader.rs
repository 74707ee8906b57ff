//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FeedSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `SHAPEFEED_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use shapefeed_core::{SessionMode, WireFormat};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{FeedSettings, LogLevel};

/// Resolve the default settings file (`~/.shapefeed/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".shapefeed").join("settings.json")
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
/// The result is validated before it is returned.
pub fn load_settings_from_path(path: &Path) -> Result<FeedSettings> {
    let defaults = serde_json::to_value(FeedSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: FeedSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides.
pub fn apply_env_overrides(settings: &mut FeedSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides using `lookup` as the variable source.
///
/// Invalid values are ignored with a warning and the file/default value stays.
pub fn apply_overrides_from<F>(settings: &mut FeedSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = get("SHAPEFEED_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = get("SHAPEFEED_PORT") {
        if let Some(port) = parse_u16_range(&v, 0, u16::MAX) {
            settings.server.port = port;
        } else {
            warn_invalid("SHAPEFEED_PORT", &v);
        }
    }
    if let Some(v) = get("SHAPEFEED_MAX_CONNECTIONS") {
        if let Some(n) = parse_usize_range(&v, 1, 100_000) {
            settings.server.max_connections = n;
        } else {
            warn_invalid("SHAPEFEED_MAX_CONNECTIONS", &v);
        }
    }

    // ── Stream ──────────────────────────────────────────────────────
    if let Some(v) = get("SHAPEFEED_INTERVAL_MS") {
        if let Some(ms) = parse_u64_range(&v, 1, 3_600_000) {
            settings.stream.interval_ms = ms;
        } else {
            warn_invalid("SHAPEFEED_INTERVAL_MS", &v);
        }
    }
    if let Some(v) = get("SHAPEFEED_RANGE_MIN") {
        if let Some(min) = parse_finite_f64(&v) {
            settings.stream.range.min = min;
        } else {
            warn_invalid("SHAPEFEED_RANGE_MIN", &v);
        }
    }
    if let Some(v) = get("SHAPEFEED_RANGE_MAX") {
        if let Some(max) = parse_finite_f64(&v) {
            settings.stream.range.max = max;
        } else {
            warn_invalid("SHAPEFEED_RANGE_MAX", &v);
        }
    }
    if let Some(v) = get("SHAPEFEED_MODE") {
        match v.parse::<SessionMode>() {
            Ok(mode) => settings.stream.mode = mode,
            Err(_) => warn_invalid("SHAPEFEED_MODE", &v),
        }
    }
    if let Some(v) = get("SHAPEFEED_WIRE_FORMAT") {
        match v.parse::<WireFormat>() {
            Ok(format) => settings.stream.wire_format = format,
            Err(_) => warn_invalid("SHAPEFEED_WIRE_FORMAT", &v),
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = get("SHAPEFEED_LOG_LEVEL") {
        if let Some(level) = LogLevel::parse(&v) {
            settings.logging.level = level;
        } else {
            warn_invalid("SHAPEFEED_LOG_LEVEL", &v);
        }
    }
    if let Some(v) = get("SHAPEFEED_LOG_JSON") {
        if let Some(json) = parse_bool(&v) {
            settings.logging.json = json;
        } else {
            warn_invalid("SHAPEFEED_LOG_JSON", &v);
        }
    }
}

fn warn_invalid(key: &str, value: &str) {
    warn!(key, value, "invalid env var, ignoring");
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a finite `f64`.
pub fn parse_finite_f64(val: &str) -> Option<f64> {
    val.parse::<f64>().ok().filter(|n| n.is_finite())
}
