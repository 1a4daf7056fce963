//! Buffered readers over a byte source.
//!
//! [`BufferedPageReader`] pulls fixed-size chunks from a [`Read`]er, feeds
//! them byte by byte to a [`SyncWindow`] and hands out pages one at a time.
//! [`BufferedStreamReader`] adds a single packet reassembler on top, for
//! input that carries just one logical stream (or where the caller does not
//! care which stream a packet belongs to). Use a [`Demuxer`] as the page
//! sink of a [`BufferedPageReader`] for multiplexed input.
//!
//! [`Demuxer`]: crate::demux::Demuxer

use crate::config::ReaderConfig;
use crate::framing::PacketsFromSegments;
use crate::sync::SyncWindow;
use log::debug;
use oxiogg_core::error::{OggError, Result};
use oxiogg_core::page::Page;
use oxiogg_core::traits::{PacketSink, PageSink};
use std::io::{ErrorKind, Read};

/// Reads validated pages from a byte source.
#[derive(Debug)]
pub struct BufferedPageReader<R> {
    inner: R,
    config: ReaderConfig,
    chunk: Box<[u8]>,
    /// Next unread byte in `chunk`.
    position: usize,
    /// Number of bytes the last read placed in `chunk`.
    filled: usize,
    window: SyncWindow,
    pages: u64,
}

impl<R: Read> BufferedPageReader<R> {
    /// Create a reader with the default configuration.
    pub fn new(inner: R) -> Self {
        Self::build(inner, ReaderConfig::DEFAULT)
    }

    /// Create a reader with a custom configuration.
    pub fn with_config(inner: R, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(inner, config))
    }

    fn build(inner: R, config: ReaderConfig) -> Self {
        Self {
            inner,
            config,
            chunk: vec![0; config.chunk_size].into_boxed_slice(),
            position: 0,
            filled: 0,
            window: SyncWindow::new(),
            pages: 0,
        }
    }

    /// Deliver the next page to `sink`.
    ///
    /// Returns `Ok(false)` once the byte source is exhausted. Bytes left in
    /// the sync window at that point are logged, or reported as
    /// [`OggError::TruncatedStream`] under a strict end-of-input policy.
    pub fn read_next_page<S: PageSink + ?Sized>(&mut self, sink: &mut S) -> Result<bool> {
        if !self.fill_window()? {
            return Ok(false);
        }
        self.window.consume_page(sink);
        self.pages += 1;
        Ok(true)
    }

    /// Look at the next page without consuming it.
    pub fn peek_page(&mut self) -> Result<Option<Page<'_>>> {
        if !self.fill_window()? {
            return Ok(None);
        }
        Ok(self.window.current_page())
    }

    /// Deliver the leading run of BOS pages.
    ///
    /// The first page without the BOS flag stays unread, so the following
    /// [`BufferedPageReader::read_next_page`] returns it. Returns the number
    /// of pages delivered.
    pub fn read_starting_bos_pages<S>(&mut self, sink: &mut S) -> Result<usize>
    where
        S: PageSink + ?Sized,
    {
        let mut count = 0;
        while self.peek_page()?.is_some_and(|page| page.is_bos()) {
            self.read_next_page(sink)?;
            count += 1;
        }
        Ok(count)
    }

    /// Deliver all remaining pages. Returns the number delivered.
    pub fn read_to_end<S: PageSink + ?Sized>(&mut self, sink: &mut S) -> Result<u64> {
        let mut count = 0;
        while self.read_next_page(sink)? {
            count += 1;
        }
        Ok(count)
    }

    /// Bytes held in the sync window that have not been delivered as a page.
    pub fn trailing_bytes(&self) -> usize {
        self.window.len()
    }

    /// Number of pages delivered so far.
    pub fn pages_read(&self) -> u64 {
        self.pages
    }

    /// Number of bytes dropped while resynchronizing.
    pub fn skipped_bytes(&self) -> u64 {
        self.window.skipped_bytes()
    }

    /// The configuration in use.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Get a reference to the byte source.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the reader and return the byte source.
    ///
    /// Bytes already read into the internal buffers are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read until a page is ready at the head of the window.
    ///
    /// Returns false at end of input, after applying the end-of-input policy.
    fn fill_window(&mut self) -> Result<bool> {
        while self.window.poll().is_none() {
            match self.next_byte()? {
                Some(byte) => {
                    self.window.add_byte(byte);
                }
                None => {
                    self.finish()?;
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.position == self.filled && !self.refill()? {
            return Ok(None);
        }
        let byte = self.chunk[self.position];
        self.position += 1;
        Ok(Some(byte))
    }

    fn refill(&mut self) -> Result<bool> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.position = 0;
                    self.filled = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn finish(&self) -> Result<()> {
        let trailing = self.window.len();
        if trailing == 0 {
            return Ok(());
        }
        if self.config.strict_eof {
            return Err(OggError::truncated_stream(trailing));
        }
        debug!("end of input with {} byte(s) that never formed a page", trailing);
        Ok(())
    }
}

/// Reads packets of a single logical stream from a byte source.
///
/// Every page goes to one [`PacketsFromSegments`], whatever its serial
/// number. Packets are delivered to the sink while
/// [`BufferedStreamReader::read_next_page`] runs.
#[derive(Debug)]
pub struct BufferedStreamReader<R, P> {
    pages: BufferedPageReader<R>,
    packets: PacketsFromSegments<P>,
    last_granule_position: Option<i64>,
    /// Still withholding the tail of a packet begun before the first page.
    ignore_continued: bool,
}

impl<R: Read, P: PacketSink> BufferedStreamReader<R, P> {
    /// Create a reader with the default configuration.
    pub fn new(inner: R, sink: P) -> Self {
        Self::from_page_reader(BufferedPageReader::new(inner), sink)
    }

    /// Create a reader with a custom configuration.
    pub fn with_config(inner: R, sink: P, config: ReaderConfig) -> Result<Self> {
        Ok(Self::from_page_reader(
            BufferedPageReader::with_config(inner, config)?,
            sink,
        ))
    }

    fn from_page_reader(pages: BufferedPageReader<R>, sink: P) -> Self {
        let ignore_continued = pages.config().skip_leading_partial;
        Self {
            pages,
            packets: PacketsFromSegments::new(sink),
            last_granule_position: None,
            ignore_continued,
        }
    }

    /// Process one page, delivering the packets it completes.
    ///
    /// Returns `Ok(false)` once the byte source is exhausted.
    pub fn read_next_page(&mut self) -> Result<bool> {
        let Self {
            pages,
            packets,
            last_granule_position,
            ignore_continued,
        } = self;

        let mut on_page = |page: Page<'_>| {
            *last_granule_position = Some(page.granule_position());
            let finished = packets.push_page(page, *ignore_continued);
            *ignore_continued = *ignore_continued && page.is_continued() && finished == 0;
        };

        let more = pages.read_next_page(&mut on_page)?;
        if !more && packets.has_pending() {
            debug!(
                "end of input inside a packet, {} byte(s) pending",
                packets.pending_len()
            );
        }
        Ok(more)
    }

    /// Process all remaining pages. Returns the number processed.
    pub fn read_to_end(&mut self) -> Result<u64> {
        let mut count = 0;
        while self.read_next_page()? {
            count += 1;
        }
        Ok(count)
    }

    /// Granule position of the last page processed.
    pub fn last_granule_position(&self) -> Option<i64> {
        self.last_granule_position
    }

    /// Number of pages processed so far.
    pub fn pages_read(&self) -> u64 {
        self.pages.pages_read()
    }

    /// The underlying page reader.
    pub fn page_reader(&self) -> &BufferedPageReader<R> {
        &self.pages
    }

    /// The packet sink.
    pub fn sink(&self) -> &P {
        self.packets.sink()
    }

    /// The packet sink, mutably.
    pub fn sink_mut(&mut self) -> &mut P {
        self.packets.sink_mut()
    }

    /// Consume the reader and return the byte source and packet sink.
    pub fn into_parts(self) -> (R, P) {
        (self.pages.into_inner(), self.packets.into_sink())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiogg_core::page::flags;
    use oxiogg_core::testing::PageBuilder;
    use std::io::{self, Cursor};

    /// Returns at most `step` bytes per read, with an interruption before each.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(ErrorKind::Interrupted, "try again"));
            }
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "gone"))
        }
    }

    fn stream() -> Vec<u8> {
        [
            PageBuilder::new(1, 0).flags(flags::BOS).packet(b"head").build(),
            PageBuilder::new(1, 1)
                .granule_position(100)
                .packet(&[3; 300])
                .partial_packet(&[4; 255])
                .build(),
            PageBuilder::new(1, 2)
                .flags(flags::CONTINUED | flags::EOS)
                .granule_position(200)
                .segment(b"end")
                .build(),
        ]
        .concat()
    }

    fn collect_pages<R: Read>(reader: &mut BufferedPageReader<R>) -> Vec<Vec<u8>> {
        let mut pages = Vec::new();
        let mut sink = |page: Page<'_>| pages.push(page.as_bytes().to_vec());
        while reader.read_next_page(&mut sink).expect("read") {}
        pages
    }

    #[test]
    fn test_reads_all_pages() {
        let data = stream();
        let mut reader = BufferedPageReader::new(Cursor::new(&data));
        let pages = collect_pages(&mut reader);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages.concat(), data);
        assert_eq!(reader.pages_read(), 3);
        assert_eq!(reader.trailing_bytes(), 0);
        assert_eq!(reader.skipped_bytes(), 0);
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let data = stream();
        let source = Trickle {
            data: &data,
            step: 7,
            interrupt: false,
        };
        let mut reader = BufferedPageReader::new(source);
        assert_eq!(collect_pages(&mut reader).concat(), data);
    }

    #[test]
    fn test_io_error_propagates() {
        let mut reader = BufferedPageReader::new(Broken);
        let mut sink = |_: Page<'_>| {};
        let err = reader.read_next_page(&mut sink).unwrap_err();
        assert!(matches!(err, OggError::Io(_)));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let source = Cursor::new(Vec::<u8>::new());
        let result = BufferedPageReader::with_config(source, ReaderConfig::new(0));
        assert!(matches!(result, Err(OggError::InvalidConfig { .. })));
    }

    #[test]
    fn test_truncated_tail_policy() {
        let mut data = stream();
        data.truncate(data.len() - 2);

        let mut tolerant = BufferedPageReader::new(Cursor::new(&data));
        assert_eq!(collect_pages(&mut tolerant).len(), 2);
        assert!(tolerant.trailing_bytes() > 0);

        let source = Cursor::new(&data);
        let mut strict =
            BufferedPageReader::with_config(source, ReaderConfig::STRICT).expect("valid config");
        let mut sink = |_: Page<'_>| {};
        assert!(strict.read_next_page(&mut sink).expect("first page"));
        assert!(strict.read_next_page(&mut sink).expect("second page"));
        let err = strict.read_next_page(&mut sink).unwrap_err();
        assert!(matches!(err, OggError::TruncatedStream { trailing } if trailing > 0));
    }

    #[test]
    fn test_trailing_garbage_is_not_truncation() {
        let mut data = stream();
        data.extend_from_slice(b"junk at the end");
        let source = Cursor::new(&data);
        let mut reader =
            BufferedPageReader::with_config(source, ReaderConfig::STRICT).expect("valid config");
        assert_eq!(collect_pages(&mut reader).len(), 3);
        assert_eq!(reader.skipped_bytes(), 15);
    }

    #[test]
    fn test_starting_bos_pages() {
        let data = [
            PageBuilder::new(1, 0).flags(flags::BOS).packet(b"a").build(),
            PageBuilder::new(2, 0).flags(flags::BOS).packet(b"b").build(),
            PageBuilder::new(1, 1).packet(b"data").build(),
        ]
        .concat();

        let mut reader = BufferedPageReader::new(Cursor::new(&data));
        let mut serials = Vec::new();
        let mut sink = |page: Page<'_>| serials.push(page.stream_id());
        assert_eq!(reader.read_starting_bos_pages(&mut sink).expect("read"), 2);
        assert_eq!(serials, vec![1, 2]);

        let next = reader.peek_page().expect("read").map(|page| page.sequence_number());
        assert_eq!(next, Some(1));
        let mut sink = |page: Page<'_>| assert!(!page.is_bos());
        assert!(reader.read_next_page(&mut sink).expect("read"));
        assert_eq!(reader.read_to_end(&mut sink).expect("read"), 0);
    }

    #[test]
    fn test_stream_reader_packets() {
        let data = stream();
        let mut reader = BufferedStreamReader::new(Cursor::new(&data), Vec::<Vec<u8>>::new());

        assert!(reader.read_next_page().expect("read"));
        assert_eq!(reader.sink().len(), 1);
        assert!(reader.read_next_page().expect("read"));
        assert_eq!(reader.last_granule_position(), Some(100));
        assert_eq!(reader.read_to_end().expect("read"), 1);
        assert_eq!(reader.last_granule_position(), Some(200));
        assert_eq!(reader.pages_read(), 3);

        let mut tail = vec![4u8; 255];
        tail.extend_from_slice(b"end");
        let (_, packets) = reader.into_parts();
        assert_eq!(packets, vec![b"head".to_vec(), vec![3; 300], tail]);
    }

    #[test]
    fn test_skip_leading_partial() {
        // Input starting mid-stream: the first page finishes a packet whose
        // beginning was never read, then the next page continues it further.
        let data = [
            PageBuilder::new(1, 7)
                .flags(flags::CONTINUED)
                .partial_packet(&[9; 255])
                .build(),
            PageBuilder::new(1, 8)
                .flags(flags::CONTINUED)
                .segment(b"rest")
                .packet(b"whole")
                .build(),
        ]
        .concat();

        let config = ReaderConfig::DEFAULT.with_skip_leading_partial(true);
        let mut skipping =
            BufferedStreamReader::with_config(Cursor::new(&data), Vec::<Vec<u8>>::new(), config)
                .expect("valid");
        skipping.read_to_end().expect("read");
        assert_eq!(skipping.sink(), &vec![b"whole".to_vec()]);

        let mut keeping = BufferedStreamReader::new(Cursor::new(&data), Vec::<Vec<u8>>::new());
        keeping.read_to_end().expect("read");
        assert_eq!(keeping.sink().len(), 2);
        assert_eq!(keeping.sink()[0].len(), 259);
    }
}
