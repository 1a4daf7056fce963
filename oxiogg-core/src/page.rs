//! Ogg page model.
//!
//! A page is never copied into an owned structure. [`Page`] is a view over
//! the exact bytes of one validated page, and every field is read in place
//! at its fixed offset.
//!
//! ```text
//!  0      4   5     6                14         18         22       26     27
//!  +------+---+-----+----------------+----------+----------+--------+------+--------------+---------+
//!  | OggS | 0 | flg | granule (i64)  | serial   | sequence | CRC-32 | nseg | lacing[nseg] | payload |
//!  +------+---+-----+----------------+----------+----------+--------+------+--------------+---------+
//! ```
//!
//! All integers are little-endian. The page length is not stored; it is
//! `27 + nseg + sum(lacing)`.

use crate::crc::OggCrc32;
use crate::traits::DiscardableSegmentSink;
use std::fmt;

/// Capture pattern at the start of every page.
pub const CAPTURE_PATTERN: [u8; 4] = *b"OggS";

/// The only defined stream structure version.
pub const STREAM_STRUCTURE_VERSION: u8 = 0;

/// Length of the fixed page header, up to and including the segment count.
pub const HEADER_LENGTH: usize = 27;

/// Largest lacing value; a segment of this length continues its packet.
pub const MAX_SEGMENT_LENGTH: usize = 255;

/// Largest number of segments in one page.
pub const MAX_SEGMENTS: usize = 255;

/// Maximum legal page size: 27 header + 255 lacing values + 255 segments of 255 bytes.
pub const MAX_PAGE_LENGTH: usize = HEADER_LENGTH + MAX_SEGMENTS + MAX_SEGMENTS * MAX_SEGMENT_LENGTH;

/// Byte offsets of the header fields.
pub mod fields {
    /// Header type flags (1 byte).
    pub const FLAGS: usize = 5;
    /// Absolute granule position (8 bytes, signed).
    pub const GRANULE_POSITION: usize = 6;
    /// Stream serial number (4 bytes).
    pub const STREAM_ID: usize = 14;
    /// Page sequence number (4 bytes).
    pub const SEQUENCE_NUMBER: usize = 18;
    /// CRC-32 checksum (4 bytes).
    pub const CHECKSUM: usize = 22;
    /// Number of segments (1 byte).
    pub const SEGMENT_COUNT: usize = 26;
    /// First lacing value.
    pub const LACING_TABLE: usize = 27;
}

/// Header type flag bits.
pub mod flags {
    /// The first packet on this page continues one from the previous page.
    pub const CONTINUED: u8 = 0x01;
    /// First page of a logical stream.
    pub const BOS: u8 = 0x02;
    /// Last page of a logical stream.
    pub const EOS: u8 = 0x04;
}

/// Verdict on whether a buffer starts with a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The buffer cannot start with a valid page, whatever bytes follow.
    Invalid,
    /// Everything seen so far is consistent with a page, but it is not complete yet.
    Incomplete,
    /// A valid page of the given length starts the buffer.
    Valid(usize),
}

/// Returns the length of the page that would start `buf`.
///
/// Nothing else is checked; this is a hypothesis, not a fact. Returns `None`
/// when `buf` is too short to hold the header and lacing table.
pub fn length(buf: &[u8]) -> Option<usize> {
    let segment_count = *buf.get(fields::SEGMENT_COUNT)? as usize;
    let lacing = buf.get(fields::LACING_TABLE..fields::LACING_TABLE + segment_count)?;
    Some(HEADER_LENGTH + segment_count + lacing.iter().map(|&l| l as usize).sum::<usize>())
}

/// Checks whether `buf` starts with a complete, valid page.
///
/// `buf` holds the available bytes only. Fails on fewer than 27 bytes, a bad
/// capture pattern or version, a page running past the end of `buf`, or a
/// checksum mismatch.
pub fn is_valid(buf: &[u8]) -> bool {
    matches!(probe(buf), Probe::Valid(_))
}

/// Classifies the start of `buf`, see [`Probe`].
pub fn probe(buf: &[u8]) -> Probe {
    // Magic and version can be rejected from the very first byte.
    let prefix = buf.len().min(5);
    if buf[..prefix.min(4)] != CAPTURE_PATTERN[..prefix.min(4)] {
        return Probe::Invalid;
    }
    if prefix == 5 && buf[4] != STREAM_STRUCTURE_VERSION {
        return Probe::Invalid;
    }
    if buf.len() < HEADER_LENGTH {
        return Probe::Incomplete;
    }

    let len = match length(buf) {
        Some(len) if len <= buf.len() => len,
        _ => return Probe::Incomplete,
    };

    if compute_checksum(&buf[..len]) != read_u32(buf, fields::CHECKSUM) {
        return Probe::Invalid;
    }
    Probe::Valid(len)
}

/// Computes the CRC-32 of a complete page with its checksum field read as zero.
///
/// # Panics
///
/// Panics if `page` is shorter than the 27-byte header.
pub fn compute_checksum(page: &[u8]) -> u32 {
    let mut crc = OggCrc32::new();
    crc.update(&page[..fields::CHECKSUM]);
    crc.update_zeros(4);
    crc.update(&page[fields::SEGMENT_COUNT..]);
    crc.finalize()
}

/// Lacing values carrying a packet of `len` bytes.
///
/// As many 255 values as fit, then one terminating value in 0..=254. A
/// packet whose length is a multiple of 255 (including the empty packet)
/// ends with an explicit 0.
pub fn lacing_for(len: usize) -> impl Iterator<Item = u8> {
    let full = len / MAX_SEGMENT_LENGTH;
    let last = (len % MAX_SEGMENT_LENGTH) as u8;
    std::iter::repeat_n(MAX_SEGMENT_LENGTH as u8, full).chain(std::iter::once(last))
}

#[inline]
fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// A validated Ogg page borrowed from a buffer.
///
/// The view holds exactly the page's bytes. It borrows the buffer it came
/// from, so the buffer cannot be reused while the page is alive.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Page<'a> {
    data: &'a [u8],
}

impl<'a> Page<'a> {
    /// Validate the page at the start of `buf`.
    ///
    /// Returns `None` unless a complete page with a matching checksum starts
    /// `buf`. Trailing bytes after the page are ignored.
    pub fn parse(buf: &'a [u8]) -> Option<Self> {
        match probe(buf) {
            Probe::Valid(len) => Some(Self { data: &buf[..len] }),
            _ => None,
        }
    }

    /// Wrap bytes that the caller already validated as exactly one page,
    /// skipping the checksum pass.
    ///
    /// Getters index into `data` and will panic if this contract is broken.
    pub fn from_verified(data: &'a [u8]) -> Self {
        debug_assert_eq!(probe(data), Probe::Valid(data.len()));
        Self { data }
    }

    /// The page's bytes, header included.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Total page length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; a page has at least its header.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Header type flags.
    pub fn flags(&self) -> u8 {
        self.data[fields::FLAGS]
    }

    /// Whether the first packet continues one from the previous page.
    pub fn is_continued(&self) -> bool {
        self.flags() & flags::CONTINUED != 0
    }

    /// Whether this is the first page of its logical stream.
    pub fn is_bos(&self) -> bool {
        self.flags() & flags::BOS != 0
    }

    /// Whether this is the last page of its logical stream.
    pub fn is_eos(&self) -> bool {
        self.flags() & flags::EOS != 0
    }

    /// Absolute granule position. Its meaning is defined by the codec.
    pub fn granule_position(&self) -> i64 {
        let at = fields::GRANULE_POSITION;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[at..at + 8]);
        i64::from_le_bytes(bytes)
    }

    /// Stream serial number identifying the logical stream.
    pub fn stream_id(&self) -> u32 {
        read_u32(self.data, fields::STREAM_ID)
    }

    /// Page sequence number.
    pub fn sequence_number(&self) -> u32 {
        read_u32(self.data, fields::SEQUENCE_NUMBER)
    }

    /// Stored CRC-32 checksum.
    pub fn checksum(&self) -> u32 {
        read_u32(self.data, fields::CHECKSUM)
    }

    /// Number of segments on this page.
    pub fn segment_count(&self) -> usize {
        self.data[fields::SEGMENT_COUNT] as usize
    }

    /// The lacing table.
    pub fn lacing_values(&self) -> &'a [u8] {
        &self.data[fields::LACING_TABLE..fields::LACING_TABLE + self.segment_count()]
    }

    /// Offset of the first payload byte.
    pub fn body_offset(&self) -> usize {
        HEADER_LENGTH + self.segment_count()
    }

    /// Concatenated segment payloads.
    pub fn body(&self) -> &'a [u8] {
        &self.data[self.body_offset()..]
    }

    /// Iterate over the segment payloads in order.
    pub fn segments(&self) -> impl Iterator<Item = &'a [u8]> + use<'a> {
        let data = self.data;
        let mut offset = self.body_offset();
        self.lacing_values().iter().map(move |&lacing| {
            let segment = &data[offset..offset + lacing as usize];
            offset += lacing as usize;
            segment
        })
    }

    /// Forward this page's segments to `sink`.
    ///
    /// A page that does not continue a packet first makes the sink discard
    /// whatever partial packet it holds. Each segment is then delivered with
    /// the page's bytes as storage, followed by `end()` for every lacing value
    /// below 255, and finally `invalidate_storage()`.
    ///
    /// `ignore_continued` withholds the tail of a packet continued from an
    /// earlier page, for a reader that starts mid-stream and would otherwise
    /// see half a packet. Withheld segments are not delivered at all.
    ///
    /// Returns the number of packets finished on this page, withheld ones
    /// included. While it returns 0 with `ignore_continued` set, keep setting
    /// it; the packet being withheld has not ended yet.
    pub fn send_segments_to<S>(&self, sink: &mut S, ignore_continued: bool) -> usize
    where
        S: DiscardableSegmentSink<'a>,
    {
        let mut withhold = false;
        if self.is_continued() {
            withhold = ignore_continued;
        } else {
            sink.discard();
        }

        let mut offset = self.body_offset();
        let mut finished = 0;
        for &lacing in self.lacing_values() {
            if !withhold {
                sink.segment(self.data, offset, lacing);
                if (lacing as usize) < MAX_SEGMENT_LENGTH {
                    sink.end();
                }
            }
            if (lacing as usize) < MAX_SEGMENT_LENGTH {
                withhold = false;
                finished += 1;
            }
            offset += lacing as usize;
        }
        sink.invalidate_storage();
        finished
    }
}

impl fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("stream_id", &format_args!("{:#010x}", self.stream_id()))
            .field("sequence_number", &self.sequence_number())
            .field("granule_position", &self.granule_position())
            .field("flags", &format_args!("{:#04x}", self.flags()))
            .field("segments", &self.segment_count())
            .field("len", &self.len())
            .finish()
    }
}
