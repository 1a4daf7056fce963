//! Pages command implementation.

use crate::utils::flag_names;
use oxiogg_core::page::Page;
use oxiogg_demux::{BufferedPageReader, ReaderConfig};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// JSON serializable page header.
#[derive(Debug, Serialize)]
struct PageJson {
    serial: u32,
    sequence: u32,
    granule_position: i64,
    continued: bool,
    bos: bool,
    eos: bool,
    segments: usize,
    length: usize,
}

impl PageJson {
    fn from_page(page: &Page<'_>) -> Self {
        Self {
            serial: page.stream_id(),
            sequence: page.sequence_number(),
            granule_position: page.granule_position(),
            continued: page.is_continued(),
            bos: page.is_bos(),
            eos: page.is_eos(),
            segments: page.segment_count(),
            length: page.len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PagesJson {
    file: String,
    pages: Vec<PageJson>,
    skipped_bytes: u64,
    trailing_bytes: usize,
}

pub fn cmd_pages(
    file: &Path,
    config: ReaderConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = BufferedPageReader::with_config(File::open(file)?, config)?;

    let mut pages = Vec::new();
    let mut sink = |page: Page<'_>| pages.push(PageJson::from_page(&page));
    reader.read_to_end(&mut sink)?;

    if json {
        let output = PagesJson {
            file: file.display().to_string(),
            pages,
            skipped_bytes: reader.skipped_bytes(),
            trailing_bytes: reader.trailing_bytes(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{:>10} {:>8} {:>20} {:>12} {:>5} {:>7}",
        "Serial", "Seq", "Granule", "Flags", "Segs", "Length"
    );
    println!("{}", "-".repeat(67));
    for page in &pages {
        println!(
            "{:>#10x} {:>8} {:>20} {:>12} {:>5} {:>7}",
            page.serial,
            page.sequence,
            page.granule_position,
            flag_names(page.continued, page.bos, page.eos),
            page.segments,
            page.length
        );
    }
    println!("{}", "-".repeat(67));
    println!("{} pages", pages.len());
    if reader.skipped_bytes() > 0 {
        println!("{} bytes skipped while resynchronizing", reader.skipped_bytes());
    }
    if reader.trailing_bytes() > 0 {
        println!("{} trailing bytes did not form a page", reader.trailing_bytes());
    }

    Ok(())
}
