//! CRC-32 as used by the Ogg page checksum.
//!
//! Ogg uses the CRC-32 polynomial 0x04C11DB7 in its *forward* form: bits are
//! processed MSB-first, the register starts at zero and no final XOR is
//! applied. This is not the reflected ISO 3309 CRC used by ZIP and GZIP, so
//! the two cannot share tables.
//!
//! ## Performance Optimization
//!
//! Data of 16 bytes or more is processed with the "slicing-by-8" technique
//! using 8 pre-computed tables. Shorter inputs use the single-table loop.
//! All tables are computed at compile time and never change afterwards.

/// Ogg CRC-32 polynomial (forward, non-reflected).
pub const OGG_CRC32_POLY: u32 = 0x04C11DB7;

/// CRC-32 lookup table (polynomial 0x04C11DB7, forward).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut j = 0;
        while j < 8 {
            if crc & 0x8000_0000 != 0 {
                crc = (crc << 1) ^ OGG_CRC32_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-32 slicing-by-8 lookup tables (forward).
const CRC32_TABLE_SLICE: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];

    let mut i = 0usize;
    while i < 256 {
        tables[0][i] = CRC32_TABLE[i];
        i += 1;
    }

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = (prev << 8) ^ tables[0][(prev >> 24) as usize];
            i += 1;
        }
        t += 1;
    }

    tables
};

/// Forward CRC-32 calculator for Ogg pages.
///
/// - Polynomial: 0x04C11DB7
/// - Initial value: 0x00000000
/// - Final XOR: none
/// - Reflected input/output: No
///
/// # Example
///
/// ```
/// use oxiogg_core::crc::OggCrc32;
///
/// let mut crc = OggCrc32::new();
/// crc.update(b"1234");
/// crc.update(b"56789");
/// assert_eq!(crc.finalize(), 0x89A1897F);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OggCrc32 {
    crc: u32,
}

impl OggCrc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0 }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            crc32_slice8(&mut self.crc, data);
        } else {
            crc32_sw(&mut self.crc, data);
        }
    }

    /// Feed `count` zero bytes, as if they were present in the input.
    ///
    /// Used to stand in for the checksum field while checking a page.
    #[inline]
    pub fn update_zeros(&mut self, count: usize) {
        for _ in 0..count {
            self.crc = (self.crc << 8) ^ CRC32_TABLE[(self.crc >> 24) as usize];
        }
    }

    /// Get the current CRC value.
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

/// Single-table CRC-32, best for small data (< 16 bytes).
#[inline]
fn crc32_sw(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    for &byte in data {
        c = (c << 8) ^ CRC32_TABLE[((c >> 24) ^ byte as u32) as usize];
    }
    *crc = c;
}

/// Slicing-by-8 CRC-32, 8 bytes per step.
#[inline]
fn crc32_slice8(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    let mut chunks = data.chunks_exact(8);

    for bytes in &mut chunks {
        let one = c ^ u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

        c = CRC32_TABLE_SLICE[7][(one >> 24) as usize]
            ^ CRC32_TABLE_SLICE[6][((one >> 16) & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[5][((one >> 8) & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[4][(one & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[3][bytes[4] as usize]
            ^ CRC32_TABLE_SLICE[2][bytes[5] as usize]
            ^ CRC32_TABLE_SLICE[1][bytes[6] as usize]
            ^ CRC32_TABLE_SLICE[0][bytes[7] as usize];
    }

    *crc = c;
    crc32_sw(crc, chunks.remainder());
}
