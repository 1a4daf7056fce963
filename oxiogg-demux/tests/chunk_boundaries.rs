//! The page sequence must not depend on how the input is chunked.

use oxiogg_core::page::{Page, flags};
use oxiogg_core::testing::PageBuilder;
use oxiogg_demux::{BufferedPageReader, ReaderConfig, SyncWindow};
use std::io::Cursor;

struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_u32() as u8).collect()
    }
}

/// Pages of two streams with random packet sizes, separated by random garbage.
fn noisy_input(seed: u64) -> (Vec<u8>, Vec<Vec<u8>>) {
    let mut rng = Lcg(seed);
    let mut input = Vec::new();
    let mut pages = Vec::new();

    for seq in 0..24u32 {
        let serial = 100 + seq % 2;
        let mut builder = PageBuilder::new(serial, seq / 2).granule_position(seq as i64 * 960);
        if seq < 2 {
            builder = builder.flags(flags::BOS);
        }
        for _ in 0..1 + rng.next_u32() % 4 {
            let len = (rng.next_u32() % 1200) as usize;
            builder = builder.packet(&rng.bytes(len));
        }
        let page = builder.build();

        let garbage = (rng.next_u32() % 40) as usize;
        // Keep garbage free of 'O' so it cannot start a false page candidate.
        input.extend(rng.bytes(garbage).into_iter().map(|b| if b == b'O' { 0 } else { b }));
        input.extend_from_slice(&page);
        pages.push(page);
    }
    input.extend_from_slice(b"OggS\x00trailing partial header");
    (input, pages)
}

fn byte_at_a_time(input: &[u8]) -> Vec<Vec<u8>> {
    let mut window = SyncWindow::new();
    let mut pages = Vec::new();
    for &byte in input {
        window.add_byte(byte);
        let mut sink = |page: Page<'_>| pages.push(page.as_bytes().to_vec());
        while window.consume_page(&mut sink) {}
    }
    pages
}

fn chunked(input: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    let config = ReaderConfig::new(chunk_size);
    let mut reader = BufferedPageReader::with_config(Cursor::new(input), config).unwrap();
    let mut pages = Vec::new();
    let mut sink = |page: Page<'_>| pages.push(page.as_bytes().to_vec());
    reader.read_to_end(&mut sink).unwrap();
    pages
}

#[test]
fn test_chunk_size_independence() {
    for seed in [1u64, 42, 0xC0FFEE] {
        let (input, expected) = noisy_input(seed);
        let reference = byte_at_a_time(&input);
        assert_eq!(reference, expected, "seed {}", seed);

        for chunk_size in [1usize, 2, 3, 27, 255, 512, 4096, 70_000] {
            assert_eq!(
                chunked(&input, chunk_size),
                reference,
                "seed {} chunk size {}",
                seed,
                chunk_size
            );
        }
    }
}

#[test]
fn test_pure_garbage_yields_nothing() {
    let mut rng = Lcg(7);
    let input = rng.bytes(100_000);
    assert!(byte_at_a_time(&input).is_empty());
    assert!(chunked(&input, 512).is_empty());
}

#[test]
fn test_strict_eof_reports_partial_header() {
    let (input, expected) = noisy_input(3);
    let source = Cursor::new(&input);
    let mut reader = BufferedPageReader::with_config(source, ReaderConfig::STRICT).unwrap();

    let mut count = 0;
    let mut sink = |_: Page<'_>| count += 1;
    let err = reader.read_to_end(&mut sink).unwrap_err();
    assert!(err.to_string().contains("Truncated stream"));
    assert_eq!(count, expected.len());
}
