//! Reader configuration.

use oxiogg_core::error::{OggError, Result};

/// Configuration for the buffered readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Number of bytes requested from the byte source per read.
    pub chunk_size: usize,
    /// Treat end of input with undelivered bytes in the sync window as an
    /// error instead of a silent end of stream.
    pub strict_eof: bool,
    /// Withhold the tail of a packet continued from before the first page
    /// read, for input that starts in the middle of a stream.
    pub skip_leading_partial: bool,
}

impl ReaderConfig {
    /// Default chunk size in bytes.
    pub const DEFAULT_CHUNK_SIZE: usize = 512;

    /// Tolerant defaults.
    ///
    /// - 512-byte chunks
    /// - Trailing garbage at end of input is ignored
    /// - Leading partial packets are delivered as-is
    pub const DEFAULT: Self = Self {
        chunk_size: Self::DEFAULT_CHUNK_SIZE,
        strict_eof: false,
        skip_leading_partial: false,
    };

    /// Like [`ReaderConfig::DEFAULT`], but a truncated final page is an error.
    pub const STRICT: Self = Self {
        chunk_size: Self::DEFAULT_CHUNK_SIZE,
        strict_eof: true,
        skip_leading_partial: false,
    };

    /// Create a configuration with the given chunk size and default policies.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::DEFAULT
        }
    }

    /// Set the end-of-input policy.
    pub fn with_strict_eof(mut self, strict_eof: bool) -> Self {
        self.strict_eof = strict_eof;
        self
    }

    /// Set whether a leading continued packet is withheld.
    pub fn with_skip_leading_partial(mut self, skip: bool) -> Self {
        self.skip_leading_partial = skip;
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(OggError::invalid_config("chunk size must be non-zero"));
        }
        Ok(())
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
