//! OxiOgg CLI - Ogg container inspector
//!
//! Lists pages, logical streams and packets of Ogg files using the Pure Rust
//! OxiOgg demultiplexer.

mod commands;
mod utils;

use clap::{Args, Parser, Subcommand};
use commands::{cmd_packets, cmd_pages, cmd_streams};
use env_logger::{Builder, Env};
use log::error;
use oxiogg_demux::ReaderConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxiogg")]
#[command(author, version, about = "Inspect Ogg container files")]
#[command(long_about = "
OxiOgg reads Ogg files page by page, resynchronizing past corrupt data,
and reports pages, logical streams and reassembled packets.

Examples:
  oxiogg pages music.ogg
  oxiogg streams movie.ogv --json
  oxiogg packets voice.opus
  oxiogg packets movie.ogv --serial 0x1a2b3c4d
  RUST_LOG=trace oxiogg pages damaged.ogg
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    reader: ReaderArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Copy)]
struct ReaderArgs {
    /// Bytes requested from the file per read
    #[arg(long, global = true, default_value_t = ReaderConfig::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Fail if the file ends inside a page
    #[arg(long, global = true)]
    strict: bool,
}

impl ReaderArgs {
    fn config(&self) -> ReaderConfig {
        ReaderConfig::new(self.chunk_size).with_strict_eof(self.strict)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List every valid page
    #[command(alias = "p")]
    Pages {
        /// Ogg file to read
        file: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// List the logical streams
    #[command(alias = "s")]
    Streams {
        /// Ogg file to read
        file: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// List reassembled packets
    Packets {
        /// Ogg file to read
        file: PathBuf,

        /// Only packets of this stream serial (decimal or 0x hex)
        #[arg(short, long, value_parser = utils::parse_serial)]
        serial: Option<u32>,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = cli.reader.config();
    let result = match cli.command {
        Commands::Pages { file, json } => cmd_pages(&file, config, json),
        Commands::Streams { file, json } => cmd_streams(&file, config, json),
        Commands::Packets { file, serial, json } => cmd_packets(&file, config, serial, json),
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
