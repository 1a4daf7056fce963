//! # OxiOgg Core
//!
//! Core components for the OxiOgg container library.
//!
//! This crate provides the stateless building blocks of Ogg framing:
//!
//! - [`page`]: Page layout, field accessors and validity check
//! - [`crc`]: The forward CRC-32 used by page checksums
//! - [`traits`]: Page, segment and packet sink traits
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Tools                                               │
//! │     oxiogg CLI                                          │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Demux (oxiogg-demux)                                │
//! │     Sync window, packet framing, stream demultiplexer   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Page model (this crate)                             │
//! │     Page view, CRC-32, sink traits                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiogg_core::page::{self, Page};
//!
//! // An Ogg page with no segments.
//! let mut bytes = vec![
//!     b'O', b'g', b'g', b'S', 0, 0x02, // capture, version, BOS
//!     0, 0, 0, 0, 0, 0, 0, 0, // granule position
//!     1, 0, 0, 0, // stream serial
//!     0, 0, 0, 0, // sequence number
//!     0, 0, 0, 0, // checksum
//!     0, // segment count
//! ];
//! let crc = page::compute_checksum(&bytes);
//! bytes[22..26].copy_from_slice(&crc.to_le_bytes());
//!
//! let page = Page::parse(&bytes).unwrap();
//! assert!(page.is_bos());
//! assert_eq!(page.stream_id(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod crc;
pub mod error;
pub mod page;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod traits;

// Re-exports for convenience
pub use crc::OggCrc32;
pub use error::{OggError, Result};
pub use page::{MAX_PAGE_LENGTH, Page, Probe};
pub use traits::{DiscardableSegmentSink, PacketSink, PageSink, SegmentSink};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{OggError, Result};
    pub use crate::page::{Page, Probe};
    pub use crate::traits::{DiscardableSegmentSink, PacketSink, PageSink, SegmentSink};
}
