//! Building blocks for a 9P2000-style wire format: fixed-width little-endian integers, strings with a `u16` length
//! prefix, byte blobs with a `u32` length prefix, sequences with a `u16` element count and structs as the plain
//! concatenation of their fields.
//!
//! The [`wire`] module holds stateless encoders and decoders on byte slices. [`Buffer`] wraps them into an
//! incremental encoder/decoder with a sticky error. [`Value`] and [`Shape`] model messages dynamically. For
//! encoding Rust types directly, see the `wire9-serde` crate.
//!
//! # A note on lengths
//!
//! Length prefixes are narrower than `usize`. Strings longer than 65535 bytes, blobs longer than `u32::MAX` bytes
//! and sequences with more than 65535 elements cannot be represented. They are rejected with
//! `Error::InvalidArgument` instead of having their length silently truncated.
//!
//! # Examples
//!
//! ```
//! use wire9::*;
//!
//! let shape = Shape::Struct(vec![Shape::U16, Shape::Seq(Box::new(Shape::Str))]);
//! let value = Value::Struct(vec![
//!     Value::U16(8192),
//!     Value::Seq(vec![Value::Str("usr".to_owned()), Value::Str("glenda".to_owned())]),
//! ]);
//!
//! let mut buf = Buffer::default();
//! value.encode(&mut buf).unwrap();
//! assert_eq!(buf.bytes(), [
//!     0x00, 0x20,             // u16 8192
//!     0x02, 0x00,             // sequence of 2 elements
//!     0x03, 0x00,             // string of length 3
//!     0x75, 0x73, 0x72,       // 'usr'
//!     0x06, 0x00,             // string of length 6
//!     0x67, 0x6c, 0x65, 0x6e, // 'glen'
//!     0x64, 0x61,             // 'da'
//! ]);
//! assert_eq!(value.size(), 17);
//!
//! let decoded = Value::decode(&shape, &mut buf).unwrap();
//! assert_eq!(value, decoded);
//! assert!(buf.is_empty());
//! ```

mod buffer;
mod error;
mod value;
pub mod wire;

pub use buffer::*;
pub use error::*;
pub use value::*;
