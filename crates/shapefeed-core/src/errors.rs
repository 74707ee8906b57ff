//! Core error types.

use thiserror::Error;

/// Errors raised while building, encoding, or decoding samples.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The configured range is empty, inverted, or not finite.
    #[error("invalid sample range [{min}, {max})")]
    InvalidRange {
        /// Inclusive lower bound.
        min: f64,
        /// Exclusive upper bound.
        max: f64,
    },
    /// Sample JSON could not be written or parsed.
    #[error("sample JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A wire format name was not recognized.
    #[error("unknown wire format {0:?} (expected \"object\" or \"encodedString\")")]
    UnknownWireFormat(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_range_display() {
        let err = CoreError::InvalidRange { min: 1.0, max: 0.5 };
        assert_eq!(err.to_string(), "invalid sample range [1, 0.5)");
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Json(_)));
        assert!(err.to_string().starts_with("sample JSON error"));
    }

    #[test]
    fn unknown_wire_format_display() {
        let err = CoreError::UnknownWireFormat("xml".into());
        assert_eq!(
            err.to_string(),
            r#"unknown wire format "xml" (expected "object" or "encodedString")"#
        );
    }
}
