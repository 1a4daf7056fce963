//! Benchmarks for page synchronization and packet reassembly.
//!
//! - Clean input through the buffered page reader
//! - Garbage-heavy input, where every byte costs a resync probe
//! - Full packet reassembly through the stream reader

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxiogg_core::page::{Page, flags};
use oxiogg_core::testing::PageBuilder;
use oxiogg_demux::{BufferedPageReader, BufferedStreamReader, ReaderConfig};
use std::hint::black_box;
use std::io::Cursor;

/// Pseudo-random bytes from a linear congruential generator.
fn random(size: usize, seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut seed = seed;
    for _ in 0..size {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((seed >> 32) as u8);
    }
    data
}

/// About 1 MiB of pages carrying 4 KiB packets.
fn clean_stream() -> Vec<u8> {
    let packet = random(4096, 0x0123_4567);
    let mut out = Vec::new();
    for seq in 0..256u32 {
        let mut builder = PageBuilder::new(1, seq).granule_position(seq as i64 * 1024);
        if seq == 0 {
            builder = builder.flags(flags::BOS);
        }
        out.extend_from_slice(&builder.packet(&packet).build());
    }
    out
}

fn bench_page_reader(c: &mut Criterion) {
    let clean = clean_stream();
    let garbage = random(clean.len(), 0xFEED);

    let mut group = c.benchmark_group("page_reader");
    group.throughput(Throughput::Bytes(clean.len() as u64));

    for (name, input) in [("clean", &clean), ("garbage", &garbage)] {
        for chunk_size in [512usize, 16384] {
            group.bench_with_input(
                BenchmarkId::new(name, chunk_size),
                input,
                |b, input| {
                    b.iter(|| {
                        let config = ReaderConfig::new(chunk_size);
                        let source = Cursor::new(black_box(input.as_slice()));
                        let mut reader = BufferedPageReader::with_config(source, config).unwrap();
                        let mut sink = |page: Page<'_>| {
                            black_box(page.len());
                        };
                        reader.read_to_end(&mut sink).unwrap()
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_packet_reassembly(c: &mut Criterion) {
    let clean = clean_stream();

    let mut group = c.benchmark_group("stream_reader");
    group.throughput(Throughput::Bytes(clean.len() as u64));
    group.bench_function("packets", |b| {
        b.iter(|| {
            let mut total = 0usize;
            let sink = |data: &[u8]| total += data.len();
            let mut reader = BufferedStreamReader::new(Cursor::new(black_box(&clean)), sink);
            reader.read_to_end().unwrap();
            drop(reader);
            total
        })
    });
    group.finish();
}

criterion_group!(benches, bench_page_reader, bench_packet_reassembly);
criterion_main!(benches);
