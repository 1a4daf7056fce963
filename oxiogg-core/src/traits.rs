//! Sink traits connecting the framing stages.
//!
//! Data flows downstream through three kinds of receiver:
//!
//! - [`PageSink`] receives whole validated pages.
//! - [`SegmentSink`] receives the laced segments of a page.
//! - [`PacketSink`] receives reassembled packets.
//!
//! Segment sinks are parameterized by the lifetime `'s` of the storage the
//! segments live in. A sink may keep references into that storage between
//! calls (zero-copy reassembly) but must stop using them once
//! [`SegmentSink::invalidate_storage`] returns; the lifetime makes any attempt
//! to hold on past the storage's reuse a compile error.

use crate::page::Page;
use std::collections::VecDeque;

/// Receives segments.
pub trait SegmentSink<'s> {
    /// Receive one segment: `storage[offset..offset + lacing]`.
    ///
    /// A segment is at most 255 bytes. A lacing value below 255 ends the
    /// current packet, and the sender follows it with [`SegmentSink::end`].
    fn segment(&mut self, storage: &'s [u8], offset: usize, lacing: u8);

    /// The current packet is complete.
    fn end(&mut self);

    /// Storage handed to [`SegmentSink::segment`] becomes invalid when this
    /// returns. Called once per page after all its segments were delivered.
    fn invalidate_storage(&mut self);
}

/// A segment sink that can abandon a partially received packet.
///
/// Kept apart from [`SegmentSink`] because a writer producing pages cannot
/// take back segments it already emitted.
pub trait DiscardableSegmentSink<'s>: SegmentSink<'s> {
    /// Discard the current packet, if any.
    ///
    /// Sent before every page that does not continue a packet, so a
    /// truncated packet is never merged with unrelated data.
    fn discard(&mut self);
}

/// Receives reassembled packets.
///
/// The slice is only valid for the duration of the call. It may point
/// straight into a page buffer that is reused right after; copy it to keep it.
pub trait PacketSink {
    /// Receive one complete packet.
    fn packet(&mut self, data: &[u8]);
}

impl<F> PacketSink for F
where
    F: FnMut(&[u8]),
{
    fn packet(&mut self, data: &[u8]) {
        self(data)
    }
}

impl PacketSink for Vec<Vec<u8>> {
    fn packet(&mut self, data: &[u8]) {
        self.push(data.to_vec());
    }
}

impl PacketSink for VecDeque<Vec<u8>> {
    fn packet(&mut self, data: &[u8]) {
        self.push_back(data.to_vec());
    }
}

/// Receives validated pages.
pub trait PageSink {
    /// Receive one page. The page borrows the reader's buffer.
    fn page(&mut self, page: Page<'_>);
}

impl<F> PageSink for F
where
    F: FnMut(Page<'_>),
{
    fn page(&mut self, page: Page<'_>) {
        self(page)
    }
}
