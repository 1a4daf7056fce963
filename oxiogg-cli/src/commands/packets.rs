//! Packets command implementation.

use crate::utils::hex_prefix;
use oxiogg_demux::{BufferedStreamReader, ReaderConfig, demux};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Leading bytes shown per packet.
const PREVIEW_BYTES: usize = 16;

/// JSON serializable packet summary.
#[derive(Debug, Serialize)]
struct PacketJson {
    index: usize,
    length: usize,
    head: String,
}

/// Collects packet summaries without keeping packet data.
#[derive(Debug, Default)]
struct Summaries(Vec<PacketJson>);

impl Summaries {
    fn push(&mut self, data: &[u8]) {
        self.0.push(PacketJson {
            index: self.0.len(),
            length: data.len(),
            head: hex_prefix(data, PREVIEW_BYTES),
        });
    }
}

/// Summaries of every packet of the file, or of one stream when `serial` is given.
fn collect(
    file: &Path,
    config: ReaderConfig,
    serial: Option<u32>,
) -> Result<Vec<PacketJson>, Box<dyn std::error::Error>> {
    let mut summaries = Summaries::default();
    match serial {
        Some(serial) => {
            let demuxer = demux(File::open(file)?, config)?;
            for packet in demuxer.lookup(serial)?.packets() {
                summaries.push(packet);
            }
        }
        None => {
            let sink = |data: &[u8]| summaries.push(data);
            let mut reader = BufferedStreamReader::with_config(File::open(file)?, sink, config)?;
            reader.read_to_end()?;
        }
    }
    Ok(summaries.0)
}

pub fn cmd_packets(
    file: &Path,
    config: ReaderConfig,
    serial: Option<u32>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let packets = collect(file, config, serial)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&packets)?);
        return Ok(());
    }

    println!("{:>8} {:>8}  Head", "Index", "Length");
    println!("{}", "-".repeat(60));
    for packet in &packets {
        println!("{:>8} {:>8}  {}", packet.index, packet.length, packet.head);
    }
    println!("{}", "-".repeat(60));
    let total: usize = packets.iter().map(|p| p.length).sum();
    println!("{} packets, {} bytes", packets.len(), total);

    Ok(())
}
