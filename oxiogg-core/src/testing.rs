//! Page serialization for tests.
//!
//! Enabled by the `test-util` feature. This is a single-page builder used to
//! produce fixtures, not a multiplexing writer.

use crate::page::{self, HEADER_LENGTH, MAX_SEGMENT_LENGTH, MAX_SEGMENTS, fields};

/// Builds one serialized page with a correct checksum.
#[derive(Debug, Clone)]
pub struct PageBuilder {
    flags: u8,
    granule_position: i64,
    stream_id: u32,
    sequence_number: u32,
    lacing: Vec<u8>,
    body: Vec<u8>,
}

impl PageBuilder {
    /// Start an empty page for the given stream and sequence number.
    pub fn new(stream_id: u32, sequence_number: u32) -> Self {
        Self {
            flags: 0,
            granule_position: 0,
            stream_id,
            sequence_number,
            lacing: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Set the header flags.
    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Set the absolute granule position.
    pub fn granule_position(mut self, granule_position: i64) -> Self {
        self.granule_position = granule_position;
        self
    }

    /// Append one raw segment; its length becomes the lacing value.
    ///
    /// # Panics
    ///
    /// Panics if `data` is longer than 255 bytes.
    pub fn segment(mut self, data: &[u8]) -> Self {
        assert!(data.len() <= MAX_SEGMENT_LENGTH, "segment too long");
        self.lacing.push(data.len() as u8);
        self.body.extend_from_slice(data);
        self
    }

    /// Append a complete packet, laced and terminated.
    pub fn packet(mut self, data: &[u8]) -> Self {
        let mut offset = 0;
        for lacing in page::lacing_for(data.len()) {
            let end = offset + lacing as usize;
            self = self.segment(&data[offset..end]);
            offset = end;
        }
        self
    }

    /// Append the start of a packet that continues on the next page.
    ///
    /// # Panics
    ///
    /// Panics unless `data.len()` is a multiple of 255.
    pub fn partial_packet(mut self, data: &[u8]) -> Self {
        assert!(
            data.len() % MAX_SEGMENT_LENGTH == 0,
            "partial packet must fill whole segments"
        );
        for chunk in data.chunks(MAX_SEGMENT_LENGTH) {
            self = self.segment(chunk);
        }
        self
    }

    /// Serialize the page and fill in its checksum.
    ///
    /// # Panics
    ///
    /// Panics if more than 255 segments were added.
    pub fn build(&self) -> Vec<u8> {
        assert!(self.lacing.len() <= MAX_SEGMENTS, "too many segments");

        let mut out = Vec::with_capacity(HEADER_LENGTH + self.lacing.len() + self.body.len());
        out.extend_from_slice(&page::CAPTURE_PATTERN);
        out.push(page::STREAM_STRUCTURE_VERSION);
        out.push(self.flags);
        out.extend_from_slice(&self.granule_position.to_le_bytes());
        out.extend_from_slice(&self.stream_id.to_le_bytes());
        out.extend_from_slice(&self.sequence_number.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.push(self.lacing.len() as u8);
        out.extend_from_slice(&self.lacing);
        out.extend_from_slice(&self.body);

        let crc = page::compute_checksum(&out);
        out[fields::CHECKSUM..fields::CHECKSUM + 4].copy_from_slice(&crc.to_le_bytes());
        out
    }
}
