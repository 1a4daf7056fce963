//! Command implementations for OxiOgg CLI.

pub mod packets;
pub mod pages;
pub mod streams;

pub use packets::cmd_packets;
pub use pages::cmd_pages;
pub use streams::cmd_streams;
