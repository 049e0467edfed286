//! A growable byte buffer with a read cursor and a sticky error slot.
//!
//! Encoding appends to the end of the buffer, decoding consumes from the front. Decoding never returns a `Result`:
//! the first error is stored inside the buffer and every following `get_*` call returns a zero value without
//! consuming anything. A sequence of reads can therefore be issued in one go and checked once at the end.
//!
//! ```
//! use wire9::{Buffer, Error};
//!
//! let mut buf = Buffer::default();
//! buf.put_u16(9);
//! buf.put_string("Tversion");
//!
//! assert_eq!(buf.get_u16(), 9);
//! assert_eq!(buf.get_string(), "Tversion");
//! assert_eq!(buf.get_u64(), 0); // nothing left
//! assert_eq!(buf.err(), Some(&Error::Eof));
//! ```

use crate::error::{DrainError, Error};
use crate::wire;
use std::io::{self, Write};

/// Size of the first allocation of a buffer that has none yet
const BOOTSTRAP_SIZE: usize = 128;
/// Above this capacity the buffer stops doubling and grows by exactly the requested amount
const MAX_DOUBLING: usize = 4 * 1024 * 1024;

#[derive(Debug, Default, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    /// Start of the unread portion of `data`
    pos: usize,
    err: Option<Error>,
}

impl Buffer {

    /// Creates a buffer whose unread portion is `data`. The buffer takes ownership of the bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0, err: None }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Vec::with_capacity(capacity))
    }

    /// Number of unread bytes
    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// The unread portion of the buffer
    pub fn bytes(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Consumes the buffer and returns its unread portion
    pub fn into_vec(mut self) -> Vec<u8> {
        self.data.drain(..self.pos);
        self.data
    }

    /// The first error this buffer encountered, if any
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Like [`Buffer::err`], but as a `Result` for use with `?`
    pub fn check(&self) -> Result<(), Error> {
        match &self.err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Records `err` unless an earlier error is already recorded
    pub fn set_err(&mut self, err: Error) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Drops all data and the recorded error. The allocated storage is kept.
    pub fn reset(&mut self) {
        self.data.clear();
        self.pos = 0;
        self.err = None;
    }

    /// Makes room for `n` more bytes at the end of the buffer. The unread bytes slide to the front when that frees
    /// at least half of the capacity; otherwise the capacity doubles plus `n`, or grows by exactly `n` once doubling
    /// would exceed [`MAX_DOUBLING`].
    fn grow(&mut self, n: usize) {
        let end = self.data.len().checked_add(n).unwrap_or_else(|| panic!("buffer too large"));
        let cap = self.data.capacity();
        if end <= cap {
            return;
        }
        if cap == 0 {
            self.data.reserve_exact(n.max(BOOTSTRAP_SIZE));
            return;
        }
        if self.pos > 0 && self.len() + n <= cap / 2 {
            self.reclaim();
            return;
        }
        let capacity = match cap.checked_mul(2).and_then(|c| c.checked_add(n)) {
            Some(c) if c <= MAX_DOUBLING => c,
            _ => cap.checked_add(n).unwrap_or_else(|| panic!("buffer too large")),
        };
        if capacity > isize::MAX as usize {
            panic!("buffer too large");
        }
        self.reclaim();
        self.data.reserve_exact(capacity - self.data.len());
    }

    /// Drops the consumed prefix
    fn reclaim(&mut self) {
        self.data.drain(..self.pos);
        self.pos = 0;
    }

    pub fn put_u8(&mut self, v: u8) {
        self.grow(1);
        wire::put_u8(&mut self.data, v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.grow(2);
        wire::put_u16(&mut self.data, v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.grow(4);
        wire::put_u32(&mut self.data, v);
    }

    pub fn put_u64(&mut self, v: u64) {
        self.grow(8);
        wire::put_u64(&mut self.data, v);
    }

    /// Appends a string with a `u16` length prefix. A string that does not fit the prefix is not written at all and
    /// records [`Error::InvalidArgument`].
    pub fn put_string(&mut self, v: &str) {
        if let Err(e) = wire::string_len(v.len()) {
            return self.set_err(e);
        }
        self.grow(wire::STRING_PREFIX + v.len());
        if let Err(e) = wire::put_string(&mut self.data, v) {
            self.set_err(e);
        }
    }

    /// Appends a byte blob with a `u32` length prefix. A blob that does not fit the prefix is not written at all
    /// and records [`Error::InvalidArgument`].
    pub fn put_bytes(&mut self, v: &[u8]) {
        if let Err(e) = wire::bytes_len(v.len()) {
            return self.set_err(e);
        }
        self.grow(wire::BYTES_PREFIX + v.len());
        if let Err(e) = wire::put_bytes(&mut self.data, v) {
            self.set_err(e);
        }
    }

    /// Runs a primitive decoder on the unread bytes. On success the cursor moves past the value, otherwise the
    /// error is recorded and zero returned.
    #[inline]
    fn consume<T: Default>(&mut self, decode: fn(&[u8]) -> (T, isize)) -> T {
        if self.err.is_some() {
            return T::default();
        }
        let (v, n) = decode(&self.data[self.pos..]);
        match wire::parse_error(n) {
            Some(e) => {
                self.err = Some(e);
                T::default()
            },
            None => {
                self.pos += n as usize;
                v
            }
        }
    }

    pub fn get_u8(&mut self) -> u8 {
        self.consume(wire::consume_u8)
    }

    pub fn get_u16(&mut self) -> u16 {
        self.consume(wire::consume_u16)
    }

    pub fn get_u32(&mut self) -> u32 {
        self.consume(wire::consume_u32)
    }

    pub fn get_u64(&mut self) -> u64 {
        self.consume(wire::consume_u64)
    }

    /// Reads a string with a `u16` length prefix. Returns an empty string and consumes nothing if the input is
    /// truncated or not valid UTF-8.
    pub fn get_string(&mut self) -> String {
        if self.err.is_some() {
            return String::new();
        }
        let (v, n) = wire::consume_string(&self.data[self.pos..]);
        let v = v.to_owned();
        self.advance(n);
        v
    }

    /// Reads a byte blob with a `u32` length prefix. Returns an empty vector and consumes nothing if the input is
    /// truncated.
    pub fn get_bytes(&mut self) -> Vec<u8> {
        if self.err.is_some() {
            return Vec::new();
        }
        let (v, n) = wire::consume_bytes(&self.data[self.pos..]);
        let v = v.to_vec();
        self.advance(n);
        v
    }

    #[inline]
    fn advance(&mut self, n: isize) {
        match wire::parse_error(n) {
            Some(e) => self.err = Some(e),
            None => self.pos += n as usize,
        }
    }

    /// Writes the whole unread portion to `w` with a single `write` call and resets the buffer afterwards. Returns
    /// the number of written bytes.
    pub fn write_to<W: Write>(&mut self, mut w: W) -> Result<usize, DrainError> {
        let expected = self.len();
        if expected == 0 {
            return Err(DrainError::Empty);
        }
        let written = w.write(&self.data[self.pos..])?;
        if written != expected {
            self.pos += written.min(expected);
            return Err(DrainError::ShortWrite { written, expected });
        }
        self.reset();
        Ok(written)
    }

}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Buffer::new(data)
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.grow(buf.len());
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reading copies from the unread portion. An exhausted buffer yields `Ok(0)`, which `Read` defines as the end of
/// input.
impl io::Read for Buffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.len().min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::{Buffer, MAX_DOUBLING};
    use crate::error::{DrainError, Error};
    use std::io::{self, LineWriter, Write};

    #[test]
    fn scalars() {
        let mut buf = Buffer::default();
        buf.put_u64(u64::MAX);
        buf.put_u32(u32::MAX);
        buf.put_u16(u16::MAX);
        buf.put_u8(u8::MAX);
        buf.put_u64(42);
        assert_eq!(buf.len(), 23);
        assert_eq!(buf.get_u64(), u64::MAX);
        assert_eq!(buf.get_u32(), u32::MAX);
        assert_eq!(buf.get_u16(), u16::MAX);
        assert_eq!(buf.get_u8(), u8::MAX);
        assert_eq!(buf.get_u64(), 42);
        assert!(buf.is_empty());
        assert_eq!(buf.err(), None);
    }

    #[test]
    fn strings_and_bytes() {
        let mut buf = Buffer::default();
        buf.put_string("hello world");
        buf.put_bytes(b"\x00\x01\x02");
        buf.put_string("");
        assert_eq!(buf.len(), 13 + 7 + 2);
        assert_eq!(buf.get_string(), "hello world");
        assert_eq!(buf.get_bytes(), [0, 1, 2]);
        assert_eq!(buf.get_string(), "");
        assert_eq!(buf.check(), Ok(()));
    }

    #[test]
    fn u64_from_three_bytes() {
        let mut buf = Buffer::new(vec![1, 2, 3]);
        assert_eq!(buf.get_u64(), 0);
        assert_eq!(buf.err(), Some(&Error::Eof));
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn truncated_string_consumes_nothing() {
        let mut buf = Buffer::new(vec![10, 0, b'h', b'i']);
        assert_eq!(buf.get_string(), "");
        assert_eq!(buf.err(), Some(&Error::Eof));
        assert_eq!(buf.bytes(), [10, 0, b'h', b'i']);

        let mut buf = Buffer::new(vec![10, 0, 0, 0, 1]);
        assert!(buf.get_bytes().is_empty());
        assert_eq!(buf.check(), Err(Error::Eof));
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn sticky_error() {
        let mut buf = Buffer::new(vec![2, 0, 0xc3, 0x28, 7, 7, 7, 7]);
        assert_eq!(buf.get_string(), "");
        assert_eq!(buf.err(), Some(&Error::InvalidUtf8));
        // everything after the first error is a no-op
        assert_eq!(buf.get_u8(), 0);
        assert_eq!(buf.get_u32(), 0);
        assert_eq!(buf.get_bytes(), Vec::<u8>::new());
        buf.set_err(Error::Eof);
        assert_eq!(buf.err(), Some(&Error::InvalidUtf8));
        assert_eq!(buf.len(), 8);

        buf.reset();
        assert_eq!(buf.err(), None);
        assert!(buf.is_empty());
        buf.put_u8(5);
        assert_eq!(buf.get_u8(), 5);
    }

    #[test]
    fn oversized_string_is_rejected() {
        let mut buf = Buffer::default();
        buf.put_u8(1);
        buf.put_string(&"x".repeat(u16::MAX as usize + 1));
        assert!(matches!(buf.err(), Some(Error::InvalidArgument(_))));
        assert_eq!(buf.bytes(), [1]);
    }

    #[test]
    fn growth_keeps_earlier_bytes() {
        let mut buf = Buffer::default();
        let mut last = 0;
        for i in 0..10_000u32 {
            buf.put_u32(i);
            assert!(buf.capacity() >= last);
            last = buf.capacity();
        }
        for i in 0..10_000u32 {
            assert_eq!(buf.get_u32(), i);
        }
        assert_eq!(buf.err(), None);
    }

    #[test]
    fn growth_policy() {
        let mut buf = Buffer::default();
        buf.put_u8(0);
        assert_eq!(buf.capacity(), 128);
        buf.write_all(&[0; 127]).unwrap();
        assert_eq!(buf.capacity(), 128);
        buf.put_u8(0);
        assert_eq!(buf.capacity(), 128 * 2 + 1);

        let mut buf = Buffer::with_capacity(MAX_DOUBLING);
        buf.write_all(&vec![1; MAX_DOUBLING]).unwrap();
        buf.put_u64(2);
        assert_eq!(buf.capacity(), MAX_DOUBLING + 8);
    }

    #[test]
    fn consumed_prefix_is_reclaimed() {
        let mut buf = Buffer::with_capacity(16);
        buf.write_all(&[1; 16]).unwrap();
        for _ in 0..12 {
            buf.get_u8();
        }
        buf.put_u16(u16::MAX);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.bytes(), [1, 1, 1, 1, 255, 255]);

        // a small consumed prefix is not worth sliding the unread bytes for
        let mut buf = Buffer::with_capacity(16);
        buf.write_all(&[1; 16]).unwrap();
        buf.get_u8();
        buf.put_u8(2);
        assert_eq!(buf.capacity(), 16 * 2 + 1);
        assert_eq!(buf.len(), 16);
    }

    #[test]
    fn interleaved_reads_and_writes_at_capacity() {
        let mut buf = Buffer::with_capacity(1024);
        for i in 0..1024u32 {
            buf.put_u8(i as u8);
        }
        let mut resizes = 0;
        let mut cap = buf.capacity();
        for i in 1024..100_000u32 {
            assert_eq!(buf.get_u8(), (i - 1024) as u8);
            buf.put_u8(i as u8);
            if buf.capacity() != cap {
                resizes += 1;
                cap = buf.capacity();
            }
        }
        assert_eq!(buf.len(), 1024);
        assert!(resizes <= 2, "{} resizes", resizes);
        assert!(buf.capacity() <= 4 * 1024 + 3);
        assert_eq!(buf.err(), None);
    }

    #[test]
    fn write_to() {
        let text = "Rwalk returns one qid for each path element that could be walked.";
        let mut sink = Vec::new();
        let mut buf = Buffer::default();
        buf.write_all(text.as_bytes()).unwrap();

        assert_eq!(buf.write_to(&mut sink).unwrap(), text.len());
        assert_eq!(sink, text.as_bytes());
        assert_eq!(buf.len(), 0);
        assert!(matches!(buf.write_to(&mut sink), Err(DrainError::Empty)));
    }

    struct Trickle;

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len().min(3))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_write() {
        let mut buf = Buffer::new(b"abcdef".to_vec());
        assert!(matches!(buf.write_to(Trickle), Err(DrainError::ShortWrite { written: 3, expected: 6 })));
        assert_eq!(buf.bytes(), b"def");
    }

    #[test]
    fn drain_into_line_writer() {
        let mut payload = vec![b'\n'];
        payload.extend_from_slice(&[b'x'; 2000]);
        let mut sink = LineWriter::new(Vec::new());
        let mut buf = Buffer::new(payload.clone());
        let mut short = 0;
        loop {
            match buf.write_to(&mut sink) {
                Ok(_) => break,
                Err(DrainError::ShortWrite { written, expected }) => {
                    assert!(written < expected);
                    assert_eq!(buf.len(), expected - written);
                    short += 1;
                },
                Err(e) => panic!("unexpected {}", e),
            }
        }
        assert!(short > 0);
        assert!(buf.is_empty());
        sink.flush().unwrap();
        assert_eq!(sink.get_ref(), &payload);
    }

    #[test]
    fn read() {
        let mut buf = Buffer::default();
        for (data, len) in [("abcd", 4), ("abcd", 3), ("abcd", 2), ("abcd", 1), ("abcd", 0), ("abcd", 5), ("abcd", 6), ("", 6)] {
            buf.reset();
            buf.write_all(data.as_bytes()).unwrap();
            let mut dst = vec![0; len];
            let n = io::Read::read(&mut buf, &mut dst).unwrap();
            assert_eq!(n, data.len().min(len));
            assert_eq!(&dst[..n], &data.as_bytes()[..n]);
            assert_eq!(buf.len(), data.len().saturating_sub(len));
        }
    }

    #[test]
    fn copy() {
        let text = "RULE 7: Option arguments cannot be optional. --- Sys V Interface p 343.";
        let mut buf = Buffer::default();
        buf.write_all(text.as_bytes()).unwrap();
        let mut sink = Vec::new();
        assert_eq!(io::copy(&mut buf, &mut sink).unwrap(), text.len() as u64);
        assert!(buf.is_empty());
        assert_eq!(sink, text.as_bytes());
    }

    #[test]
    fn into_vec_drops_consumed_bytes() {
        let mut buf = Buffer::new(vec![1, 2, 3]);
        buf.get_u8();
        assert_eq!(buf.into_vec(), [2, 3]);
    }

}
