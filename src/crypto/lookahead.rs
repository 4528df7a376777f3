//! Bounded lookahead buffer for streaming decryption
//!
//! Decryption has to hold back the trailing authentication tag while the
//! rest of the stream flows through. This buffer makes that explicit: fill
//! it to capacity, peek at what is buffered, consume the leading part, and
//! repeat until the reader is drained.

use std::io::{ErrorKind, Read};

/// Fixed-capacity read buffer with explicit peek and consume.
pub struct Lookahead {
    buf: Vec<u8>,
    start: usize,
    end: usize,
}

impl Lookahead {
    /// Create a buffer holding up to `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Lookahead {
            buf: vec![0u8; capacity],
            start: 0,
            end: 0,
        }
    }

    /// Top up the buffer from `reader` until it is full or the input ends.
    ///
    /// Returns `true` once the reader is exhausted. Interrupted reads are
    /// retried.
    pub fn fill<R: Read>(&mut self, reader: &mut R) -> std::io::Result<bool> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }

        while self.end < self.buf.len() {
            match reader.read(&mut self.buf[self.end..]) {
                Ok(0) => return Ok(true),
                Ok(n) => self.end += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(false)
    }

    /// Number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View of the buffered bytes.
    pub fn buffered(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// Mutable view of the buffered bytes.
    pub fn buffered_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.start..self.end]
    }

    /// Discard the first `n` buffered bytes.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len());
        self.start += n;
    }
}
