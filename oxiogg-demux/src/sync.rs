//! Sync window: page recognition over a byte stream.
//!
//! The window accumulates bytes one at a time and keeps a valid page at its
//! head whenever one can be found. Bytes that cannot start a page (wrong
//! capture pattern or version, failed checksum) are dropped from the head
//! one at a time until the head is either a complete page or the plausible
//! beginning of one. Garbage input therefore costs one cheap check per byte,
//! and a CRC pass only when a candidate page is complete.
//!
//! The window holds at most [`MAX_PAGE_LENGTH`] bytes, so any page that
//! starts at its head fits entirely.

use log::trace;
use oxiogg_core::page::{self, MAX_PAGE_LENGTH, Page, Probe};
use oxiogg_core::traits::PageSink;

/// Rolling buffer that recognizes pages at its head.
///
/// [`SyncWindow::current_page`] borrows the window, so the buffer cannot be
/// modified while a page taken from it is still in use.
#[derive(Debug, Clone)]
pub struct SyncWindow {
    /// Backing storage, `MAX_PAGE_LENGTH` bytes.
    buffer: Box<[u8]>,
    /// Number of leading bytes holding real data.
    len: usize,
    /// Length of the confirmed page at the head, if any.
    ready: Option<usize>,
    /// Contents changed since the head was last examined.
    stale: bool,
    /// Bytes dropped while resynchronizing.
    skipped: u64,
}

impl Default for SyncWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncWindow {
    /// Create an empty sync window.
    pub fn new() -> Self {
        Self {
            buffer: vec![0; MAX_PAGE_LENGTH].into_boxed_slice(),
            len: 0,
            ready: None,
            stale: false,
            skipped: 0,
        }
    }

    /// Window capacity, the maximum legal page size.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the window holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bytes currently held.
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Total number of bytes dropped as garbage so far.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// Drop all held bytes.
    pub fn reset(&mut self) {
        self.len = 0;
        self.ready = None;
        self.stale = false;
    }

    /// Append one byte and resynchronize.
    ///
    /// If the window is full, the oldest byte is discarded first. Returns
    /// the length of the valid page at the head, if there now is one.
    pub fn add_byte(&mut self, byte: u8) -> Option<usize> {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = byte;
            self.len += 1;
            // A confirmed head page is unaffected by bytes behind it.
            if self.ready.is_none() {
                self.stale = true;
            }
        } else {
            self.buffer.copy_within(1.., 0);
            let last = self.buffer.len() - 1;
            self.buffer[last] = byte;
            self.ready = None;
            self.stale = true;
            self.skipped += 1;
        }
        self.poll()
    }

    /// Length of the valid page at the head, resynchronizing first if the
    /// contents changed.
    ///
    /// After [`SyncWindow::skip`] the next page may already be complete in
    /// the window; polling finds it without adding bytes.
    pub fn poll(&mut self) -> Option<usize> {
        if self.stale {
            self.resync();
        }
        self.ready
    }

    /// The confirmed page at the head, as found by the last
    /// [`SyncWindow::add_byte`] or [`SyncWindow::poll`].
    pub fn current_page(&self) -> Option<Page<'_>> {
        self.ready.map(|len| Page::from_verified(&self.buffer[..len]))
    }

    /// Consume `n` bytes from the front, normally a page just handed off.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the number of bytes held.
    pub fn skip(&mut self, n: usize) {
        assert!(
            n <= self.len,
            "can't skip {} bytes, the sync window holds {}",
            n,
            self.len
        );
        self.buffer.copy_within(n..self.len, 0);
        self.len -= n;
        self.ready = None;
        self.stale = true;
    }

    /// Hand the page at the head to `sink` and skip past it.
    ///
    /// Returns false if no complete page is at the head.
    pub fn consume_page<S: PageSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        match self.poll() {
            Some(len) => {
                sink.page(Page::from_verified(&self.buffer[..len]));
                self.skip(len);
                true
            }
            None => false,
        }
    }

    /// Drop head bytes until the head is a page or could still become one.
    fn resync(&mut self) {
        self.stale = false;

        let mut dropped = 0;
        self.ready = loop {
            match page::probe(&self.buffer[dropped..self.len]) {
                Probe::Valid(len) => break Some(len),
                Probe::Incomplete => break None,
                Probe::Invalid => dropped += 1,
            }
        };

        if dropped > 0 {
            trace!("sync window: dropped {} byte(s) while resynchronizing", dropped);
            self.buffer.copy_within(dropped..self.len, 0);
            self.len -= dropped;
            self.skipped += dropped as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiogg_core::page::flags;
    use oxiogg_core::testing::PageBuilder;

    fn feed(window: &mut SyncWindow, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut pages = Vec::new();
        for &b in bytes {
            window.add_byte(b);
            let mut sink = |page: Page<'_>| pages.push(page.as_bytes().to_vec());
            while window.consume_page(&mut sink) {}
        }
        pages
    }

    #[test]
    fn test_recognizes_page_on_last_byte() {
        let page = PageBuilder::new(5, 0).packet(b"hello").build();
        let mut window = SyncWindow::new();

        for &b in &page[..page.len() - 1] {
            assert_eq!(window.add_byte(b), None);
        }
        assert_eq!(window.add_byte(page[page.len() - 1]), Some(page.len()));
        assert_eq!(window.current_page().map(|p| p.stream_id()), Some(5));
    }

    #[test]
    fn test_garbage_before_page_is_dropped() {
        let page = PageBuilder::new(5, 0).packet(b"hello").build();
        let mut input = b"garbage\x00\xFFOgg".to_vec();
        input.extend_from_slice(&page);

        let mut window = SyncWindow::new();
        let pages = feed(&mut window, &input);
        assert_eq!(pages, vec![page]);
        assert!(window.is_empty());
        assert_eq!(window.skipped_bytes(), 12);
    }

    #[test]
    fn test_false_capture_pattern_resyncs() {
        // A bogus header claiming a long page, with a real page hidden inside
        // the bytes it claims.
        let real = PageBuilder::new(9, 0).packet(b"real").build();
        let mut input = b"OggS\x00\x00".to_vec();
        input.extend_from_slice(&[0; 20]);
        input.push(1);
        input.push(200);
        input.extend_from_slice(&real);
        input.extend_from_slice(&[0; 200]);

        let mut window = SyncWindow::new();
        let pages = feed(&mut window, &input);
        assert_eq!(pages, vec![real]);
    }

    #[test]
    fn test_back_to_back_pages() {
        let a = PageBuilder::new(1, 0).flags(flags::BOS).packet(b"a").build();
        let b = PageBuilder::new(1, 1).packet(b"bb").build();
        let c = PageBuilder::new(1, 2).flags(flags::EOS).build();
        let input = [a.clone(), b.clone(), c.clone()].concat();

        let mut window = SyncWindow::new();
        assert_eq!(feed(&mut window, &input), vec![a, b, c]);
    }

    #[test]
    fn test_poll_finds_page_after_skip() {
        let real = PageBuilder::new(3, 0).packet(b"x").build();
        let second = PageBuilder::new(3, 1).packet(b"y").build();
        let mut input = b"OggS\x00\x00".to_vec();
        input.extend_from_slice(&[0; 20]);
        input.push(1);
        input.push(250);
        input.extend_from_slice(&real);
        input.extend_from_slice(&second);
        input.resize(27 + 250 + 27, 0);

        let mut window = SyncWindow::new();
        let mut found = None;
        for &b in &input {
            if let Some(len) = window.add_byte(b) {
                found = Some(len);
                break;
            }
        }
        assert_eq!(found, Some(real.len()));
        window.skip(real.len());

        // The second page is already complete in the window.
        assert_eq!(window.poll(), Some(second.len()));
        assert_eq!(window.current_page().map(|p| p.sequence_number()), Some(1));
    }

    #[test]
    fn test_reset_drops_partial_page() {
        let page = PageBuilder::new(1, 0).packet(b"abc").build();
        let mut window = SyncWindow::new();
        for &b in &page[..10] {
            window.add_byte(b);
        }
        assert_eq!(window.len(), 10);
        window.reset();
        assert!(window.is_empty());
        assert!(window.current_page().is_none());

        let pages = feed(&mut window, &page);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    #[should_panic(expected = "can't skip")]
    fn test_skip_past_end_panics() {
        let mut window = SyncWindow::new();
        window.add_byte(b'O');
        window.skip(2);
    }

    #[test]
    fn test_full_window_shifts_oldest_byte() {
        let mut window = SyncWindow::new();
        let page = PageBuilder::new(1, 0).packet(&[0x55; 100]).build();
        for &b in &page {
            window.add_byte(b);
        }
        assert_eq!(window.poll(), Some(page.len()));

        // Keep adding without consuming until the window is full.
        for _ in 0..window.capacity() - page.len() {
            window.add_byte(0);
        }
        assert_eq!(window.len(), window.capacity());

        // One more byte pushes out the head, breaking the page.
        window.add_byte(0);
        assert!(window.len() < window.capacity());
        assert_eq!(window.poll(), None);
    }
}
