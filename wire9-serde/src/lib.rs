//! Encode and decode your Rust data structures in the `wire9` format with serde.
//!
//! The format is not self-describing: what is on the wire is determined entirely by the Rust type. Fields are
//! written in declaration order without names, tags or padding, so both ends have to agree on the types.
//!
//! # Supported types
//!
//! | Rust | wire |
//! |---|---|
//! | `u8`, `u16`, `u32`, `u64` | fixed width, little-endian |
//! | `String`, `&str` | `u16` byte length, then the UTF-8 bytes |
//! | `serde_bytes::ByteBuf`, `#[serde(with = "serde_bytes")] Vec<u8>` | `u32` byte length, then the bytes |
//! | `Vec<T>` where `T` is a string or a struct | `u16` element count, then the elements |
//! | structs, tuples, newtypes, unit | the fields one after another |
//! | `Option<T>` at the top level | `Some` is encoded as the inner value, `None` is an error |
//!
//! Anything else fails with `wire9::Error::Unsupported`, including sequences of integers (use `serde_bytes` for
//! byte blobs), sequences of `Option`s and `Option` fields.
//!
//! # Errors
//!
//! [`marshal`] and [`unmarshal`] work on a [`Buffer`] and share its sticky error: the first error of a call is
//! recorded in the buffer and every later call on the same buffer fails with that error without touching the
//! data, until [`Buffer::reset`] is called.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use wire9_serde::{marshal, size_of, unmarshal, Buffer};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Qid {
//!     kind: u8,
//!     version: u32,
//!     path: u64,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Walk {
//!     tag: u16,
//!     qids: Vec<Qid>,
//! }
//!
//! let msg = Walk {
//!     tag: 1,
//!     qids: vec![Qid { kind: 0x80, version: 7, path: 42 }],
//! };
//!
//! let mut buf = Buffer::default();
//! marshal(&mut buf, &msg).unwrap();
//! assert_eq!(buf.bytes(), [
//!     0x01, 0x00,                                     // tag
//!     0x01, 0x00,                                     // one qid follows
//!     0x80,                                           // kind
//!     0x07, 0x00, 0x00, 0x00,                         // version
//!     0x2a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // path
//! ]);
//! assert_eq!(buf.len(), size_of(&msg));
//!
//! let decoded: Walk = unmarshal(&mut buf).unwrap();
//! assert_eq!(msg, decoded);
//! ```

mod context;
mod de;
mod error;
mod ser;
mod size;

pub use de::Deserializer;
pub use error::{Error, Result};
pub use ser::Serializer;
pub use size::size_of;
pub use wire9::Buffer;

use serde::{de::DeserializeOwned, Serialize};
use std::any::type_name;

/// Appends the encoding of `value` to `buf`.
///
/// If `buf` holds an error from an earlier call, nothing happens and that error is returned. Otherwise the first
/// error while encoding aborts the call and becomes the error of `buf`. Bytes written before the failure stay in
/// the buffer.
pub fn marshal<T: ?Sized + Serialize>(buf: &mut Buffer, value: &T) -> Result<()> {
    buf.check()?;
    let result = value.serialize(&mut Serializer::with_root(buf, type_name::<T>()));
    result.map_err(|e| record(buf, e))
}

/// Decodes a `T` from the front of `buf`.
///
/// Like [`marshal`], this fails right away if `buf` holds an error, and records its own first error in `buf`.
/// Several values are decoded in one call by asking for a tuple: `unmarshal::<(u16, String)>(buf)`.
pub fn unmarshal<T: DeserializeOwned>(buf: &mut Buffer) -> Result<T> {
    buf.check()?;
    let result = T::deserialize(&mut Deserializer::new(buf));
    result.map_err(|e| record(buf, e))
}

/// Decodes into an existing value. `dst` is left untouched if decoding fails.
pub fn unmarshal_into<T: DeserializeOwned>(buf: &mut Buffer, dst: &mut T) -> Result<()> {
    *dst = unmarshal(buf)?;
    Ok(())
}

/// Encodes `value` into a new vector, allocated up front with the size reported by [`size_of`].
pub fn to_bytes<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Buffer::with_capacity(size_of(value));
    marshal(&mut buf, value)?;
    Ok(buf.into_vec())
}

/// Decodes a `T` that has to span all of `bytes`.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut buf = Buffer::new(bytes.to_vec());
    let value = unmarshal(&mut buf)?;
    match buf.len() {
        0 => Ok(value),
        n => Err(Error::Trailing(n)),
    }
}

/// Records `e` as the sticky error of `buf` and returns whichever error is recorded there now.
fn record(buf: &mut Buffer, e: Error) -> Error {
    let e = e.into_inner();
    let first = buf.err().cloned().unwrap_or_else(|| e.clone());
    buf.set_err(e);
    Error::Codec(first)
}

/// Marshals several values into a buffer, left to right, stopping at the first failure.
///
/// ```
/// use wire9_serde::{marshal, Buffer};
///
/// let mut buf = Buffer::default();
/// marshal!(&mut buf, 100u8, 7u16, "Tflush").unwrap();
/// assert_eq!(buf.len(), 1 + 2 + 2 + 6);
/// ```
#[macro_export]
macro_rules! marshal {
    ($buf:expr, $($value:expr),+ $(,)?) => {{
        let buf: &mut $crate::Buffer = $buf;
        let mut result = Ok(());
        $(
            if result.is_ok() {
                result = $crate::marshal(&mut *buf, &$value);
            }
        )+
        result
    }};
}

/// The sum of [`size_of`] over several values. Values that cannot be encoded count as 0.
///
/// ```
/// use wire9_serde::size_of;
///
/// assert_eq!(size_of!(100u8, 7u16, "Tflush"), 11);
/// ```
#[macro_export]
macro_rules! size_of {
    ($($value:expr),+ $(,)?) => {
        0usize $( + $crate::size_of(&$value) )+
    };
}
