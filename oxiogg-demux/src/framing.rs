//! Packet framing: segments to packets and back.
//!
//! Ogg splits every packet into segments of up to 255 bytes. A segment of
//! exactly 255 bytes means the packet continues in the next segment,
//! possibly on the next page; anything shorter ends it. A packet whose
//! length is a multiple of 255 ends with an explicit empty segment.
//!
//! [`PacketsFromSegments`] reverses the lacing. Segments of one packet that
//! lie back to back in the same storage (the common case inside a page) are
//! passed on as a single borrowed slice without copying. Only a packet that
//! spans storages, typically two pages, is gathered in an owned buffer.

use log::debug;
use oxiogg_core::page::{self, Page};
use oxiogg_core::traits::{DiscardableSegmentSink, PacketSink, SegmentSink};

/// Reassembles packets from laced segments.
///
/// Segments are fed through a [`SegmentAssembly`] borrowed with
/// [`PacketsFromSegments::assemble`], or a page at a time with
/// [`PacketsFromSegments::push_page`]. Between assemblies only the owned
/// buffer survives, so nothing here can outlive the storage it was fed from.
#[derive(Debug)]
pub struct PacketsFromSegments<P> {
    sink: P,
    /// Owned copy of the packet in progress, valid while `copying` is set.
    buffer: Vec<u8>,
    copying: bool,
}

impl<P: PacketSink> PacketsFromSegments<P> {
    /// Create a reassembler delivering packets to `sink`.
    pub fn new(sink: P) -> Self {
        Self {
            sink,
            buffer: Vec::new(),
            copying: false,
        }
    }

    /// Borrow a segment sink for storage of lifetime `'s`.
    ///
    /// Dropping the assembly invalidates the storage, copying any pending
    /// zero-copy packet into the owned buffer.
    pub fn assemble<'s>(&mut self) -> SegmentAssembly<'_, 's, P> {
        SegmentAssembly {
            state: self,
            view: None,
        }
    }

    /// Feed all segments of `page`. See [`Page::send_segments_to`].
    pub fn push_page(&mut self, page: Page<'_>, ignore_continued: bool) -> usize {
        let mut assembly = self.assemble();
        page.send_segments_to(&mut assembly, ignore_continued)
    }

    /// Whether a partial packet is carried over, waiting for more segments.
    pub fn has_pending(&self) -> bool {
        self.copying
    }

    /// Number of bytes of the carried-over partial packet.
    pub fn pending_len(&self) -> usize {
        if self.copying { self.buffer.len() } else { 0 }
    }

    /// Abandon the carried-over partial packet, if any.
    pub fn discard(&mut self) {
        if self.copying {
            debug!("discarding truncated packet of {} bytes", self.buffer.len());
        }
        self.buffer.clear();
        self.copying = false;
    }

    /// The packet sink.
    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// The packet sink, mutably.
    pub fn sink_mut(&mut self) -> &mut P {
        &mut self.sink
    }

    /// Consume the reassembler and return its sink. A pending partial packet is lost.
    pub fn into_sink(self) -> P {
        self.sink
    }

    fn emit_owned(&mut self) {
        self.sink.packet(&self.buffer);
        self.buffer.clear();
        self.copying = false;
    }

    fn start_copy(&mut self, head: &[u8]) {
        self.buffer.clear();
        self.buffer.extend_from_slice(head);
        self.copying = true;
    }
}

/// Packet bytes still in the storage they arrived in.
#[derive(Debug, Clone, Copy)]
struct ZeroCopyView<'s> {
    storage: &'s [u8],
    start: usize,
    end: usize,
}

impl<'s> ZeroCopyView<'s> {
    fn bytes(&self) -> &'s [u8] {
        &self.storage[self.start..self.end]
    }
}

/// Segment sink over one storage buffer, borrowed from [`PacketsFromSegments`].
///
/// Holds the zero-copy view of the packet in progress. The view cannot
/// outlive `'s`, and dropping the assembly copies it out.
#[derive(Debug)]
pub struct SegmentAssembly<'r, 's, P: PacketSink> {
    state: &'r mut PacketsFromSegments<P>,
    view: Option<ZeroCopyView<'s>>,
}

impl<P: PacketSink> SegmentAssembly<'_, '_, P> {
    /// Whether the packet in progress is still a zero-copy view.
    pub fn is_zero_copy(&self) -> bool {
        self.view.is_some()
    }
}

impl<'s, P: PacketSink> SegmentSink<'s> for SegmentAssembly<'_, 's, P> {
    fn segment(&mut self, storage: &'s [u8], offset: usize, lacing: u8) {
        let end = offset + lacing as usize;

        if self.state.copying {
            self.state.buffer.extend_from_slice(&storage[offset..end]);
            return;
        }

        // An empty segment adds nothing and must not force a copy.
        if lacing == 0 {
            if self.view.is_none() {
                self.view = Some(ZeroCopyView {
                    storage,
                    start: offset,
                    end,
                });
            }
            return;
        }

        match &mut self.view {
            Some(view) if std::ptr::eq(view.storage, storage) && view.end == offset => {
                view.end = end;
            }
            Some(view) => {
                let head = view.bytes();
                self.state.start_copy(head);
                self.state.buffer.extend_from_slice(&storage[offset..end]);
                self.view = None;
            }
            None => {
                self.view = Some(ZeroCopyView {
                    storage,
                    start: offset,
                    end,
                });
            }
        }
    }

    fn end(&mut self) {
        if self.state.copying {
            self.state.emit_owned();
        } else {
            let bytes = self.view.take().map_or(&[][..], |view| view.bytes());
            self.state.sink.packet(bytes);
        }
    }

    fn invalidate_storage(&mut self) {
        if let Some(view) = self.view.take() {
            self.state.start_copy(view.bytes());
        }
    }
}

impl<'s, P: PacketSink> DiscardableSegmentSink<'s> for SegmentAssembly<'_, 's, P> {
    fn discard(&mut self) {
        self.view = None;
        self.state.discard();
    }
}

impl<P: PacketSink> Drop for SegmentAssembly<'_, '_, P> {
    fn drop(&mut self) {
        self.invalidate_storage();
    }
}

/// Lace `packet` into `sink`: 255-byte segments, one final segment of
/// 0..=254 bytes, then `end()`.
///
/// The segments borrow `packet` itself, so a zero-copy receiver sees them as
/// contiguous. Storage is not invalidated here.
pub fn packet_to_segments<'s, S>(packet: &'s [u8], sink: &mut S)
where
    S: SegmentSink<'s> + ?Sized,
{
    let mut offset = 0;
    for lacing in page::lacing_for(packet.len()) {
        sink.segment(packet, offset, lacing);
        offset += lacing as usize;
    }
    sink.end();
}

/// Splits packets into segments for a segment sink.
///
/// The packet slice only lives for the duration of
/// [`PacketSink::packet`], so the storage is invalidated after every packet
/// and the sink must accept storage of any lifetime.
#[derive(Debug)]
pub struct SegmentsFromPackets<S> {
    sink: S,
}

impl<S> SegmentsFromPackets<S>
where
    S: for<'s> SegmentSink<'s>,
{
    /// Create a splitter feeding `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// The segment sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the splitter and return its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S> PacketSink for SegmentsFromPackets<S>
where
    S: for<'s> SegmentSink<'s>,
{
    fn packet(&mut self, data: &[u8]) {
        packet_to_segments(data, &mut self.sink);
        self.sink.invalidate_storage();
    }
}
