//! Streams command implementation.

use crate::utils::codec_name;
use oxiogg_demux::{LogicalStream, ReaderConfig, demux};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// JSON serializable logical stream summary.
#[derive(Debug, Serialize)]
struct StreamJson {
    serial: u32,
    codec: &'static str,
    state: &'static str,
    pages: u64,
    packets: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_granule_position: Option<i64>,
}

impl StreamJson {
    fn from_stream(stream: &LogicalStream) -> Self {
        Self {
            serial: stream.serial(),
            codec: codec_name(stream.first_packet()),
            state: stream.state().name(),
            pages: stream.page_count(),
            packets: stream.packet_count(),
            last_granule_position: stream.last_granule_position(),
        }
    }
}

pub fn cmd_streams(
    file: &Path,
    config: ReaderConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let demuxer = demux(File::open(file)?, config)?;
    let streams: Vec<StreamJson> = demuxer
        .streams()
        .iter()
        .map(StreamJson::from_stream)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&streams)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!(
        "{:>10} {:>9} {:>11} {:>7} {:>8} {:>20}",
        "Serial", "Codec", "State", "Pages", "Packets", "Granule"
    );
    println!("{}", "-".repeat(70));
    for stream in &streams {
        let granule = stream
            .last_granule_position
            .map_or_else(|| "-".to_string(), |g| g.to_string());
        println!(
            "{:>#10x} {:>9} {:>11} {:>7} {:>8} {:>20}",
            stream.serial, stream.codec, stream.state, stream.pages, stream.packets, granule
        );
    }
    println!("{}", "-".repeat(70));
    println!(
        "{} streams, {} pages ignored",
        streams.len(),
        demuxer.ignored_pages()
    );

    Ok(())
}
