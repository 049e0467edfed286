//! Stateless encoding and decoding of single wire values on raw byte slices.
//!
//! Encoders append to a `Vec<u8>`. Decoders take the input slice and return the decoded value together with the
//! number of consumed bytes. Instead of an `Err`, a decoder signals a malformed input with a negative sentinel in
//! place of the consumed count, so a legitimate zero-length result is never mistaken for a failure. [`parse_error`]
//! turns a sentinel into an [`Error`].
//!
//! All integers are little-endian. Strings carry a `u16` byte length, byte blobs a `u32` byte length.

use crate::error::Error;
use std::convert::TryFrom;
use std::str::from_utf8;

/// Sentinel: the input ended before the value was complete
pub const ERR_UNEXPECTED_EOF: isize = -1;
/// Sentinel: the bytes of a string are not valid UTF-8
pub const ERR_INVALID_UTF8: isize = -2;

/// Longest string that fits behind a `u16` length prefix
pub const MAX_STRING_LEN: usize = u16::MAX as usize;
/// Longest byte blob that fits behind a `u32` length prefix
pub const MAX_BYTES_LEN: u64 = u32::MAX as u64;
/// Most elements a sequence can hold behind its `u16` count prefix
pub const MAX_SEQ_LEN: usize = u16::MAX as usize;

/// Size of the length prefix of a string
pub const STRING_PREFIX: usize = 2;
/// Size of the length prefix of a byte blob
pub const BYTES_PREFIX: usize = 4;
/// Size of the element count prefix of a sequence
pub const SEQ_PREFIX: usize = 2;

/// Converts a sentinel into the error it stands for. Non-negative counts are no error at all.
pub fn parse_error(n: isize) -> Option<Error> {
    match n {
        n if n >= 0 => None,
        ERR_UNEXPECTED_EOF => Some(Error::Eof),
        ERR_INVALID_UTF8 => Some(Error::InvalidUtf8),
        _ => Some(Error::Message("parse error".to_owned())),
    }
}

pub fn put_u8(b: &mut Vec<u8>, v: u8) {
    b.push(v);
}

pub fn put_u16(b: &mut Vec<u8>, v: u16) {
    b.extend_from_slice(&v.to_le_bytes());
}

pub fn put_u32(b: &mut Vec<u8>, v: u32) {
    b.extend_from_slice(&v.to_le_bytes());
}

pub fn put_u64(b: &mut Vec<u8>, v: u64) {
    b.extend_from_slice(&v.to_le_bytes());
}

/// Appends `v` as a length-prefixed string. Strings longer than [`MAX_STRING_LEN`] are rejected and nothing is
/// written.
pub fn put_string(b: &mut Vec<u8>, v: &str) -> Result<(), Error> {
    let len = string_len(v.len())?;
    put_u16(b, len);
    b.extend_from_slice(v.as_bytes());
    Ok(())
}

/// Appends `v` as a length-prefixed byte blob. Blobs longer than [`MAX_BYTES_LEN`] are rejected and nothing is
/// written.
pub fn put_bytes(b: &mut Vec<u8>, v: &[u8]) -> Result<(), Error> {
    let len = bytes_len(v.len())?;
    put_u32(b, len);
    b.extend_from_slice(v);
    Ok(())
}

/// Checks that a string of `len` bytes fits its length prefix
#[inline]
pub fn string_len(len: usize) -> Result<u16, Error> {
    u16::try_from(len).map_err(|_| Error::InvalidArgument(format!("string of {} bytes exceeds maximum {}", len, MAX_STRING_LEN)))
}

/// Checks that a blob of `len` bytes fits its length prefix
#[inline]
pub fn bytes_len(len: usize) -> Result<u32, Error> {
    u32::try_from(len).map_err(|_| Error::InvalidArgument(format!("byte blob of {} bytes exceeds maximum {}", len, MAX_BYTES_LEN)))
}

/// Checks that a sequence of `len` elements fits its count prefix
#[inline]
pub fn seq_len(len: usize) -> Result<u16, Error> {
    u16::try_from(len).map_err(|_| Error::InvalidArgument(format!("sequence of {} elements exceeds maximum {}", len, MAX_SEQ_LEN)))
}

#[inline]
fn fixed<const N: usize>(b: &[u8]) -> Option<[u8; N]> {
    b.get(..N).and_then(|s| <[u8; N]>::try_from(s).ok())
}

pub fn consume_u8(b: &[u8]) -> (u8, isize) {
    match b.first() {
        Some(v) => (*v, 1),
        None => (0, ERR_UNEXPECTED_EOF),
    }
}

pub fn consume_u16(b: &[u8]) -> (u16, isize) {
    match fixed(b) {
        Some(v) => (u16::from_le_bytes(v), 2),
        None => (0, ERR_UNEXPECTED_EOF),
    }
}

pub fn consume_u32(b: &[u8]) -> (u32, isize) {
    match fixed(b) {
        Some(v) => (u32::from_le_bytes(v), 4),
        None => (0, ERR_UNEXPECTED_EOF),
    }
}

pub fn consume_u64(b: &[u8]) -> (u64, isize) {
    match fixed(b) {
        Some(v) => (u64::from_le_bytes(v), 8),
        None => (0, ERR_UNEXPECTED_EOF),
    }
}

/// Decodes a length-prefixed string, borrowing it from `b`. The declared length is checked against the remaining
/// input before anything is sliced.
pub fn consume_string(b: &[u8]) -> (&str, isize) {
    let (m, n) = consume_u16(b);
    if n < 0 {
        return ("", n);
    }
    let m = m as usize;
    let rest = &b[STRING_PREFIX..];
    if m > rest.len() {
        return ("", ERR_UNEXPECTED_EOF);
    }
    match from_utf8(&rest[..m]) {
        Ok(v) => (v, (STRING_PREFIX + m) as isize),
        Err(_) => ("", ERR_INVALID_UTF8),
    }
}

/// Decodes a length-prefixed byte blob, borrowing it from `b`. The declared length is checked against the remaining
/// input before anything is sliced.
pub fn consume_bytes(b: &[u8]) -> (&[u8], isize) {
    let (m, n) = consume_u32(b);
    if n < 0 {
        return (&[], n);
    }
    let rest = &b[BYTES_PREFIX..];
    match usize::try_from(m) {
        Ok(m) if m <= rest.len() => (&rest[..m], (BYTES_PREFIX + m) as isize),
        _ => (&[], ERR_UNEXPECTED_EOF),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian() {
        let mut buf = Vec::new();
        put_u8(&mut buf, 0x01);
        put_u16(&mut buf, 0x0302);
        put_u32(&mut buf, 0x07060504);
        put_u64(&mut buf, 0x0f0e0d0c0b0a0908);
        assert_eq!(buf, (1..=15).collect::<Vec<u8>>());
        assert_eq!(consume_u16(&buf[1..]), (0x0302, 2));
        assert_eq!(consume_u32(&buf[3..]), (0x07060504, 4));
        assert_eq!(consume_u64(&buf[7..]), (0x0f0e0d0c0b0a0908, 8));
    }

    #[test]
    fn strings_and_bytes() {
        let mut buf = Vec::new();
        put_string(&mut buf, "abcd").unwrap();
        assert_eq!(buf, [4, 0, b'a', b'b', b'c', b'd']);
        assert_eq!(consume_string(&buf), ("abcd", 6));

        buf.clear();
        put_bytes(&mut buf, &[0xff, 0x00]).unwrap();
        assert_eq!(buf, [2, 0, 0, 0, 0xff, 0x00]);
        assert_eq!(consume_bytes(&buf), (&[0xff, 0x00][..], 6));
    }

    #[test]
    fn empty_values_are_not_errors() {
        assert_eq!(consume_string(&[0, 0]), ("", 2));
        assert_eq!(consume_bytes(&[0, 0, 0, 0]), (&[][..], 4));
    }

    #[test]
    fn truncated_input() {
        assert_eq!(consume_u8(&[]).1, ERR_UNEXPECTED_EOF);
        assert_eq!(consume_u16(&[1]).1, ERR_UNEXPECTED_EOF);
        assert_eq!(consume_u32(&[1, 2, 3]).1, ERR_UNEXPECTED_EOF);
        assert_eq!(consume_u64(&[1, 2, 3]).1, ERR_UNEXPECTED_EOF);
        assert_eq!(consume_string(&[]).1, ERR_UNEXPECTED_EOF);
        assert_eq!(consume_bytes(&[]).1, ERR_UNEXPECTED_EOF);
        // declared length of 10, only two bytes follow
        assert_eq!(consume_string(&[10, 0, b'h', b'i']), ("", ERR_UNEXPECTED_EOF));
        assert_eq!(consume_bytes(&[10, 0, 0, 0, 1, 2]), (&[][..], ERR_UNEXPECTED_EOF));
    }

    #[test]
    fn invalid_utf8() {
        assert_eq!(consume_string(&[2, 0, 0xc3, 0x28]), ("", ERR_INVALID_UTF8));
    }

    #[test]
    fn sentinels() {
        assert_eq!(parse_error(0), None);
        assert_eq!(parse_error(8), None);
        assert_eq!(parse_error(ERR_UNEXPECTED_EOF), Some(Error::Eof));
        assert_eq!(parse_error(ERR_INVALID_UTF8), Some(Error::InvalidUtf8));
        assert!(matches!(parse_error(-42), Some(Error::Message(_))));
    }

    #[test]
    fn oversized_string_is_rejected() {
        let mut buf = vec![7];
        let long = "x".repeat(MAX_STRING_LEN + 1);
        assert!(matches!(put_string(&mut buf, &long), Err(Error::InvalidArgument(_))));
        assert_eq!(buf, [7]);
        put_string(&mut buf, &long[1..]).unwrap();
        assert_eq!(buf.len(), 1 + STRING_PREFIX + MAX_STRING_LEN);
    }

}
