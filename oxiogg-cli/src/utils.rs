//! Utility functions for the CLI.

/// Codec named by the identification header at the start of a stream's
/// first packet.
pub fn codec_name(first_packet: Option<&[u8]>) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x01vorbis", "vorbis"),
        (b"OpusHead", "opus"),
        (b"Speex   ", "speex"),
        (b"\x7fFLAC", "flac"),
        (b"\x80theora", "theora"),
        (b"fishead\0", "skeleton"),
    ];

    let Some(packet) = first_packet else {
        return "unknown";
    };
    SIGNATURES
        .iter()
        .find(|(magic, _)| packet.starts_with(magic))
        .map_or("unknown", |&(_, name)| name)
}

/// Parse a stream serial given in decimal or with a `0x` prefix.
pub fn parse_serial(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid serial '{}': {}", s, e))
}

/// Up to `max` leading bytes as lowercase hex.
pub fn hex_prefix(data: &[u8], max: usize) -> String {
    let mut out: String = data
        .iter()
        .take(max)
        .map(|b| format!("{:02x}", b))
        .collect();
    if data.len() > max {
        out.push_str("..");
    }
    out
}

/// Page flags as a compact string such as `"bos,eos"`.
pub fn flag_names(continued: bool, bos: bool, eos: bool) -> String {
    let names: Vec<&str> = [(continued, "cont"), (bos, "bos"), (eos, "eos")]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(",")
    }
}
