//! Logical stream demultiplexing.
//!
//! A physical Ogg stream interleaves pages of several logical streams, each
//! identified by its serial number. [`Demuxer`] routes every page to the
//! [`LogicalStream`] currently owning its serial:
//!
//! - A BOS page starts a new logical stream.
//! - Other pages go to the active stream with their serial, or are ignored
//!   when there is none.
//! - An EOS page retires its stream. The stream and its packets stay
//!   available through [`Demuxer::streams`].
//!
//! A BOS page for a serial that is still active retires the old stream as
//! [`StreamState::Superseded`] and replaces it.

use crate::framing::PacketsFromSegments;
use log::{trace, warn};
use oxiogg_core::error::{OggError, Result};
use oxiogg_core::page::Page;
use oxiogg_core::traits::{PacketSink, PageSink};
use std::collections::{HashMap, VecDeque};

/// Lifecycle of a logical stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Accepting pages.
    Active,
    /// Retired by its EOS page.
    Ended,
    /// Retired because a new BOS page reused its serial before EOS.
    Superseded,
}

impl StreamState {
    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
            Self::Superseded => "superseded",
        }
    }
}

/// Packet queue of one logical stream.
#[derive(Debug, Default)]
struct PacketQueue {
    queue: VecDeque<Vec<u8>>,
    first: Option<Vec<u8>>,
    delivered: u64,
}

impl PacketSink for PacketQueue {
    fn packet(&mut self, data: &[u8]) {
        if self.first.is_none() {
            self.first = Some(data.to_vec());
        }
        self.delivered += 1;
        self.queue.push_back(data.to_vec());
    }
}

/// One logical bitstream and the packets reassembled from its pages.
///
/// Normally created and fed by a [`Demuxer`]. It also implements
/// [`PageSink`] on its own, accepting only pages with its serial number
/// while it is active.
#[derive(Debug)]
pub struct LogicalStream {
    serial: u32,
    state: StreamState,
    last_granule_position: Option<i64>,
    pages: u64,
    reassembler: PacketsFromSegments<PacketQueue>,
}

impl LogicalStream {
    /// Create an active stream for `serial`.
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            state: StreamState::Active,
            last_granule_position: None,
            pages: 0,
            reassembler: PacketsFromSegments::new(PacketQueue::default()),
        }
    }

    /// Stream serial number.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Whether the stream still accepts pages.
    pub fn is_active(&self) -> bool {
        self.state == StreamState::Active
    }

    /// Whether the stream's EOS page was processed.
    pub fn has_ended(&self) -> bool {
        self.state == StreamState::Ended
    }

    /// Granule position of the last accepted page.
    pub fn last_granule_position(&self) -> Option<i64> {
        self.last_granule_position
    }

    /// Number of pages accepted.
    pub fn page_count(&self) -> u64 {
        self.pages
    }

    /// Number of packets completed so far, including ones already popped.
    pub fn packet_count(&self) -> u64 {
        self.reassembler.sink().delivered
    }

    /// The first packet of the stream, normally its codec identification header.
    pub fn first_packet(&self) -> Option<&[u8]> {
        self.reassembler.sink().first.as_deref()
    }

    /// Queued packets, oldest first.
    pub fn packets(&self) -> &VecDeque<Vec<u8>> {
        &self.reassembler.sink().queue
    }

    /// Queued packets, mutably.
    pub fn packets_mut(&mut self) -> &mut VecDeque<Vec<u8>> {
        &mut self.reassembler.sink_mut().queue
    }

    /// Remove and return the oldest queued packet.
    pub fn pop_packet(&mut self) -> Option<Vec<u8>> {
        self.packets_mut().pop_front()
    }

    /// Consume the stream and return its queued packets.
    pub fn into_packets(self) -> VecDeque<Vec<u8>> {
        self.reassembler.into_sink().queue
    }

    /// Whether a partial packet is waiting for a continued page.
    pub fn has_pending_packet(&self) -> bool {
        self.reassembler.has_pending()
    }

    fn accept(&mut self, page: Page<'_>) {
        self.reassembler.push_page(page, false);
        self.last_granule_position = Some(page.granule_position());
        self.pages += 1;
        if page.is_eos() {
            self.state = StreamState::Ended;
        }
    }
}

impl PageSink for LogicalStream {
    fn page(&mut self, page: Page<'_>) {
        if page.stream_id() != self.serial {
            trace!(
                "stream {:#010x}: ignoring page of stream {:#010x}",
                self.serial,
                page.stream_id()
            );
            return;
        }
        if !self.is_active() {
            trace!(
                "stream {:#010x}: ignoring page {} after retirement",
                self.serial,
                page.sequence_number()
            );
            return;
        }
        self.accept(page);
    }
}

/// Routes pages to logical streams by serial number.
#[derive(Debug, Default)]
pub struct Demuxer {
    /// Every stream started so far, in BOS order.
    streams: Vec<LogicalStream>,
    /// Serial to index in `streams`, for active streams only.
    active: HashMap<u32, usize>,
    ignored_pages: u64,
}

impl Demuxer {
    /// Create a demultiplexer with no streams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one page.
    pub fn push_page(&mut self, page: Page<'_>) {
        let serial = page.stream_id();

        if page.is_bos() {
            let index = self.streams.len();
            self.streams.push(LogicalStream::new(serial));
            if let Some(previous) = self.active.insert(serial, index) {
                warn!(
                    "stream {:#010x} restarted by a BOS page before its EOS page",
                    serial
                );
                self.streams[previous].state = StreamState::Superseded;
            } else {
                trace!("stream {:#010x}: started", serial);
            }
        }

        let Some(&index) = self.active.get(&serial) else {
            trace!(
                "ignoring page {} of unknown stream {:#010x}",
                page.sequence_number(),
                serial
            );
            self.ignored_pages += 1;
            return;
        };

        let stream = &mut self.streams[index];
        stream.accept(page);
        if stream.has_ended() {
            trace!("stream {:#010x}: ended after {} pages", serial, stream.pages);
            self.active.remove(&serial);
        }
    }

    /// All streams started so far, in order of their BOS pages.
    pub fn streams(&self) -> &[LogicalStream] {
        &self.streams
    }

    /// All streams, mutably, for draining their packet queues.
    pub fn streams_mut(&mut self) -> &mut [LogicalStream] {
        &mut self.streams
    }

    /// The active stream with `serial`, if any.
    pub fn stream(&self, serial: u32) -> Option<&LogicalStream> {
        self.active.get(&serial).map(|&index| &self.streams[index])
    }

    /// The active stream with `serial`, mutably.
    pub fn stream_mut(&mut self, serial: u32) -> Option<&mut LogicalStream> {
        self.active
            .get(&serial)
            .map(|&index| &mut self.streams[index])
    }

    /// The most recently started stream with `serial`, active or retired.
    pub fn lookup(&self, serial: u32) -> Result<&LogicalStream> {
        self.streams
            .iter()
            .rev()
            .find(|stream| stream.serial == serial)
            .ok_or_else(|| OggError::stream_not_found(serial))
    }

    /// The first stream whose first packet satisfies `predicate`.
    ///
    /// Codecs identify themselves in their first packet, so this is how a
    /// caller picks e.g. the Vorbis stream out of a multiplexed file.
    pub fn find_stream<F>(&self, mut predicate: F) -> Option<&LogicalStream>
    where
        F: FnMut(&[u8]) -> bool,
    {
        self.streams
            .iter()
            .find(|stream| stream.first_packet().is_some_and(&mut predicate))
    }

    /// Number of streams still accepting pages.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of pages dropped because no active stream owned their serial.
    pub fn ignored_pages(&self) -> u64 {
        self.ignored_pages
    }

    /// Consume the demultiplexer and return all streams.
    pub fn into_streams(self) -> Vec<LogicalStream> {
        self.streams
    }
}

impl PageSink for Demuxer {
    fn page(&mut self, page: Page<'_>) {
        self.push_page(page);
    }
}
