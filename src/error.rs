//! # Error Types
//!
//! Custom error types for the fingerprint driver using `thiserror`.
//!
//! Expected sensor outcomes (no finger yet, no match, a failed enrollment
//! phase) are not errors; see [`crate::workflow`] for those.

use thiserror::Error;

use crate::packet::status::StatusCode;

/// Main error type for the fingerprint driver
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// Protocol violations on the sending side
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Response bytes could not be parsed as a frame
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Response checksum did not match (strict mode only)
    #[error("Checksum mismatch: expected 0x{expected:04X}, got 0x{received:04X}")]
    ChecksumMismatch { expected: u16, received: u16 },

    /// No complete response arrived in time
    #[error("Timed out after {timeout_ms} ms waiting for {command} response")]
    Timeout {
        command: &'static str,
        timeout_ms: u64,
    },

    /// Sensor answered a maintenance command with a non-Ok status
    #[error("{command} rejected: {status}")]
    Rejected {
        command: &'static str,
        status: StatusCode,
    },

    /// A workflow phase was cut short by a link-level failure
    #[error("{phase} aborted: {source}")]
    Aborted {
        phase: &'static str,
        #[source]
        source: Box<FingerprintError>,
    },

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// Discovery exhausted every candidate
    #[error("No fingerprint sensor found (tried: {0})")]
    NoDeviceFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the fingerprint driver
pub type Result<T> = std::result::Result<T, FingerprintError>;

impl FingerprintError {
    /// Tag a link-level error with the workflow phase it interrupted
    pub fn in_phase(self, phase: &'static str) -> Self {
        Self::Aborted {
            phase,
            source: Box::new(self),
        }
    }

    /// True if no complete response arrived in time
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Aborted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_tag_keeps_timeout() {
        let error = FingerprintError::Timeout {
            command: "search",
            timeout_ms: 3000,
        }
        .in_phase("search");

        assert!(error.is_timeout());
        assert_eq!(
            error.to_string(),
            "search aborted: Timed out after 3000 ms waiting for search response"
        );
    }

    #[test]
    fn test_rejected_display() {
        let error = FingerprintError::Rejected {
            command: "delete-model",
            status: StatusCode::DeleteFailed,
        };
        assert_eq!(
            error.to_string(),
            "delete-model rejected: failed to delete template (0x10)"
        );
    }
}
