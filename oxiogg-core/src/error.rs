//! Error types for OxiOgg operations.
//!
//! Malformed pages and truncated packets are not errors here: the sync window
//! drops them while resynchronizing. What remains is I/O failure, the strict
//! end-of-input policy, and caller mistakes such as an unusable configuration.

use std::io;
use thiserror::Error;

/// The main error type for OxiOgg operations.
#[derive(Debug, Error)]
pub enum OggError {
    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The byte source ended with bytes left in the sync window that never
    /// formed a valid page. Only raised under a strict end-of-input policy.
    #[error("Truncated stream: {trailing} trailing bytes did not form a page")]
    TruncatedStream {
        /// Number of undelivered bytes left in the sync window.
        trailing: usize,
    },

    /// Invalid reader configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration problem.
        message: String,
    },

    /// No logical stream with the requested serial number was found.
    #[error("Logical stream not found: serial {serial:#010x}")]
    StreamNotFound {
        /// The requested stream serial number.
        serial: u32,
    },
}

/// Result type alias for OxiOgg operations.
pub type Result<T> = std::result::Result<T, OggError>;

impl OggError {
    /// Create a truncated stream error.
    pub fn truncated_stream(trailing: usize) -> Self {
        Self::TruncatedStream { trailing }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a stream not found error.
    pub fn stream_not_found(serial: u32) -> Self {
        Self::StreamNotFound { serial }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OggError::truncated_stream(17);
        assert!(err.to_string().contains("17 trailing bytes"));

        let err = OggError::invalid_config("chunk size must be non-zero");
        assert!(err.to_string().contains("chunk size"));

        let err = OggError::stream_not_found(0xBEEF);
        assert!(err.to_string().contains("0x0000beef"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "source closed");
        let err: OggError = io_err.into();
        assert!(matches!(err, OggError::Io(_)));
    }
}
