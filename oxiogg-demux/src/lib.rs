//! # OxiOgg Demux
//!
//! Ogg page synchronization, packet reassembly and logical stream
//! demultiplexing over any [`std::io::Read`] byte source.
//!
//! ## Features
//!
//! - **Resynchronizing**: Garbage and corrupt pages are skipped byte by byte
//! - **Zero-copy**: Packets inside one page are handed out as borrowed slices
//! - **Multiplexing**: Pages are routed to logical streams by serial number
//! - **Pure Rust**: No unsafe code
//!
//! ## Pipeline
//!
//! ```text
//! Read ─► BufferedPageReader ─► SyncWindow ─► Page ─┬─► PacketsFromSegments ─► PacketSink
//!                                                   └─► Demuxer ─► LogicalStream (packet queue)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiogg_core::page::flags;
//! use oxiogg_core::testing::PageBuilder;
//! use std::io::Cursor;
//!
//! let data = [
//!     PageBuilder::new(7, 0).flags(flags::BOS).packet(b"header").build(),
//!     PageBuilder::new(7, 1).flags(flags::EOS).packet(b"audio").build(),
//! ]
//! .concat();
//!
//! let packets = oxiogg_demux::read_packets(Cursor::new(data)).unwrap();
//! assert_eq!(packets, vec![b"header".to_vec(), b"audio".to_vec()]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod demux;
pub mod framing;
pub mod reader;
pub mod sync;

pub use config::ReaderConfig;
pub use demux::{Demuxer, LogicalStream, StreamState};
pub use framing::{PacketsFromSegments, SegmentAssembly, SegmentsFromPackets, packet_to_segments};
pub use reader::{BufferedPageReader, BufferedStreamReader};
pub use sync::SyncWindow;

use oxiogg_core::error::Result;
use std::io::Read;

/// Read every packet of a single-stream source into memory.
///
/// Pages are not told apart by serial number; use [`demux`] for
/// multiplexed input.
pub fn read_packets<R: Read>(reader: R) -> Result<Vec<Vec<u8>>> {
    read_packets_with_config(reader, ReaderConfig::DEFAULT)
}

/// Read every packet of a single-stream source with a custom configuration.
pub fn read_packets_with_config<R: Read>(reader: R, config: ReaderConfig) -> Result<Vec<Vec<u8>>> {
    let mut stream = BufferedStreamReader::with_config(reader, Vec::new(), config)?;
    stream.read_to_end()?;
    Ok(stream.into_parts().1)
}

/// Demultiplex a whole source into its logical streams.
///
/// # Example
///
/// ```rust
/// use oxiogg_core::page::flags;
/// use oxiogg_core::testing::PageBuilder;
/// use oxiogg_demux::{ReaderConfig, demux};
/// use std::io::Cursor;
///
/// let data = [
///     PageBuilder::new(1, 0).flags(flags::BOS).packet(b"OpusHead").build(),
///     PageBuilder::new(2, 0).flags(flags::BOS).packet(b"\x01vorbis").build(),
/// ]
/// .concat();
///
/// let demuxer = demux(Cursor::new(data), ReaderConfig::DEFAULT).unwrap();
/// assert_eq!(demuxer.streams().len(), 2);
/// assert_eq!(demuxer.active_count(), 2);
/// ```
pub fn demux<R: Read>(reader: R, config: ReaderConfig) -> Result<Demuxer> {
    let mut pages = BufferedPageReader::with_config(reader, config)?;
    let mut demuxer = Demuxer::new();
    pages.read_to_end(&mut demuxer)?;
    Ok(demuxer)
}
