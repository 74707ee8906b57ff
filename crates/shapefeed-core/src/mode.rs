//! Per-deployment session behavior.

use serde::{Deserialize, Serialize};

/// What a session does once the socket is accepted.
///
/// The two modes are mutually exclusive for a deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Wait for the client's start signal, then push samples on a fixed cadence.
    #[default]
    Stream,
    /// No start gate and no samples; inbound text is logged until disconnect.
    Listen,
}

impl SessionMode {
    /// Lowercase name as used in settings and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Listen => "listen",
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stream" => Ok(Self::Stream),
            "listen" => Ok(Self::Listen),
            other => Err(format!("unknown session mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_stream() {
        assert_eq!(SessionMode::default(), SessionMode::Stream);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Listen".parse::<SessionMode>().unwrap(), SessionMode::Listen);
        assert_eq!("STREAM".parse::<SessionMode>().unwrap(), SessionMode::Stream);
        assert!("echo".parse::<SessionMode>().is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&SessionMode::Listen).unwrap(), "\"listen\"");
        let back: SessionMode = serde_json::from_str("\"stream\"").unwrap();
        assert_eq!(back, SessionMode::Stream);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(SessionMode::Stream.to_string(), "stream");
    }
}
