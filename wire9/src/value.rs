//! A dynamically typed model of the wire format.
//!
//! The wire format is not self-describing, so decoding needs to know what to expect. A [`Shape`] describes the
//! layout of a message, a [`Value`] holds its content. Together they allow working with messages for which no Rust
//! type exists, for instance when the layout is only known at runtime.

use crate::buffer::Buffer;
use crate::error::Error;
use crate::wire;
use std::fmt::{self, Display, Formatter};
use std::mem::discriminant;

/// The layout of a wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    U8,
    U16,
    U32,
    U64,
    Str,
    Bytes,
    /// Element count followed by the elements, which must be strings or structs
    Seq(Box<Shape>),
    /// The fields in order, without any framing
    Struct(Vec<Shape>),
}

impl Shape {

    pub fn name(&self) -> &'static str {
        match *self {
            Shape::U8        => "u8",
            Shape::U16       => "u16",
            Shape::U32       => "u32",
            Shape::U64       => "u64",
            Shape::Str       => "str",
            Shape::Bytes     => "bytes",
            Shape::Seq(_)    => "sequence",
            Shape::Struct(_) => "struct",
        }
    }

    /// Checks that every sequence in this shape holds strings or structs
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Shape::Seq(inner) => match **inner {
                Shape::Str | Shape::Struct(_) => inner.validate(),
                ref other => Err(Error::Unsupported(format!("sequence of {}", other.name()))),
            },
            Shape::Struct(fields) => fields.iter().try_for_each(Shape::validate),
            _ => Ok(()),
        }
    }

}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Seq(inner)     => write!(f, "[{}]", inner),
            Shape::Struct(fields) => write!(f, "({})", fields.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" ")),
            other                 => f.write_str(other.name()),
        }
    }
}

/// A wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<Value>),
    Struct(Vec<Value>),
}

impl Value {

    fn typename(&self) -> &'static str {
        match *self {
            Value::U8(_)     => "u8",
            Value::U16(_)    => "u16",
            Value::U32(_)    => "u32",
            Value::U64(_)    => "u64",
            Value::Str(_)    => "str",
            Value::Bytes(_)  => "bytes",
            Value::Seq(_)    => "sequence",
            Value::Struct(_) => "struct",
        }
    }

    /// Appends the encoding of this value to `buf`. If `buf` already holds an error, nothing is written and that
    /// error is returned. Otherwise the first error becomes the error of `buf`.
    pub fn encode(&self, buf: &mut Buffer) -> Result<(), Error> {
        buf.check()?;
        if let Err(e) = self.encode_inner(buf) {
            buf.set_err(e);
        }
        buf.check()
    }

    fn encode_inner(&self, buf: &mut Buffer) -> Result<(), Error> {
        match self {
            Value::U8(v)  => buf.put_u8(*v),
            Value::U16(v) => buf.put_u16(*v),
            Value::U32(v) => buf.put_u32(*v),
            Value::U64(v) => buf.put_u64(*v),
            Value::Str(v) => buf.put_string(v),
            Value::Bytes(v) => buf.put_bytes(v),
            Value::Seq(elements) => {
                Self::check_elements(elements)?;
                buf.put_u16(wire::seq_len(elements.len())?);
                for element in elements {
                    element.encode_inner(buf)?;
                }
            },
            Value::Struct(fields) => {
                for field in fields {
                    field.encode_inner(buf)?;
                }
            },
        }
        buf.check()
    }

    fn check_elements(elements: &[Value]) -> Result<(), Error> {
        let first = match elements.first() {
            Some(first @ Value::Str(_)) | Some(first @ Value::Struct(_)) => first,
            Some(other) => return Err(Error::Unsupported(format!("sequence of {}", other.typename()))),
            None => return Ok(()),
        };
        match elements.iter().find(|e| discriminant(*e) != discriminant(first)) {
            Some(other) => Err(Error::InvalidArgument(format!("sequence of {} contains a {}", first.typename(), other.typename()))),
            None => Ok(()),
        }
    }

    /// The number of bytes [`Value::encode`] writes for this value. A value that cannot be encoded has size 0.
    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(0)
    }

    fn checked_size(&self) -> Option<usize> {
        match self {
            Value::U8(_)  => Some(1),
            Value::U16(_) => Some(2),
            Value::U32(_) => Some(4),
            Value::U64(_) => Some(8),
            Value::Str(v) => wire::string_len(v.len()).ok().map(|_| wire::STRING_PREFIX + v.len()),
            Value::Bytes(v) => wire::bytes_len(v.len()).ok().map(|_| wire::BYTES_PREFIX + v.len()),
            Value::Seq(elements) => {
                Self::check_elements(elements).ok()?;
                wire::seq_len(elements.len()).ok()?;
                elements.iter().try_fold(wire::SEQ_PREFIX, |n, e| Some(n + e.checked_size()?))
            },
            Value::Struct(fields) => fields.iter().try_fold(0, |n, f| Some(n + f.checked_size()?)),
        }
    }

    /// Decodes a value of the given shape from the front of `buf`.
    /// Errors stick to `buf` the same way they do for [`Value::encode`].
    pub fn decode(shape: &Shape, buf: &mut Buffer) -> Result<Value, Error> {
        buf.check()?;
        match shape.validate().and_then(|_| Self::decode_inner(shape, buf)) {
            Ok(value) => buf.check().map(|_| value),
            Err(e) => {
                buf.set_err(e.clone());
                Err(buf.err().cloned().unwrap_or(e))
            },
        }
    }

    fn decode_inner(shape: &Shape, buf: &mut Buffer) -> Result<Value, Error> {
        Ok(match shape {
            Shape::U8  => Value::U8(buf.get_u8()),
            Shape::U16 => Value::U16(buf.get_u16()),
            Shape::U32 => Value::U32(buf.get_u32()),
            Shape::U64 => Value::U64(buf.get_u64()),
            Shape::Str => Value::Str(buf.get_string()),
            Shape::Bytes => Value::Bytes(buf.get_bytes()),
            Shape::Seq(inner) => {
                let count = buf.get_u16() as usize;
                let mut elements = Vec::with_capacity(count.min(buf.len()));
                for _ in 0..count {
                    buf.check()?;
                    elements.push(Self::decode_inner(inner, buf)?);
                }
                Value::Seq(elements)
            },
            Shape::Struct(fields) => Value::Struct(fields.iter().map(|f| Self::decode_inner(f, buf)).collect::<Result<_, _>>()?),
        })
    }

}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v)    => write!(f, "{}u8", v),
            Value::U16(v)   => write!(f, "{}u16", v),
            Value::U32(v)   => write!(f, "{}u32", v),
            Value::U64(v)   => write!(f, "{}u64", v),
            Value::Str(v)   => write!(f, "\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")),
            Value::Bytes(v) => write!(f, "'{}'", b64(v)),
            Value::Seq(v) if v.is_empty()    => f.write_str("[]"),
            Value::Struct(v) if v.is_empty() => f.write_str("()"),
            Value::Seq(v)    => write!(f, "[\n{}\n]", indented(v)),
            Value::Struct(v) => write!(f, "(\n{}\n)", indented(v)),
        }
    }
}

fn indented(values: &[Value]) -> String {
    values.iter()
        .flat_map(|v| format!("{},", v).lines().map(|line| format!("  {}", line)).collect::<Vec<String>>())
        .collect::<Vec<String>>().join("\n")
}

fn b64(input: &[u8]) -> String {
    const CHAR_SET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((input.len() + 2) / 3 * 4);
    for chunk in input.chunks(3) {
        let mut array = [0u8; 4];
        array[1..1 + chunk.len()].copy_from_slice(chunk);
        let x = u32::from_be_bytes(array);
        for o in 0..4 {
            if o <= chunk.len() {
                out.push(CHAR_SET[(x >> (18 - 6 * o) & 0x3f) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::{Shape, Value};
    use crate::buffer::Buffer;
    use crate::error::Error;

    fn tstruct() -> (Shape, Value) {
        (
            Shape::Struct(vec![Shape::U64, Shape::U32, Shape::U16, Shape::U8, Shape::Str]),
            Value::Struct(vec![
                Value::U64(u64::MAX),
                Value::U32(u32::MAX),
                Value::U16(u16::MAX),
                Value::U8(u8::MAX),
                Value::Str("hello world".to_owned()),
            ]),
        )
    }

    fn assert_roundtrip(shape: &Shape, value: Value) {
        let mut buf = Buffer::default();
        value.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), value.size());
        assert_eq!(value, Value::decode(shape, &mut buf).unwrap());
        assert!(buf.is_empty());
    }

    #[test]
    fn sizes() {
        let (_, s) = tstruct();
        assert_eq!(s.size(), 28);
        assert_eq!(Value::Seq(vec![s.clone(), s.clone(), s]).size(), 86);
        assert_eq!(Value::Seq(vec![]).size(), 2);
        assert_eq!(Value::Struct(vec![]).size(), 0);
        assert_eq!(Value::Bytes(b"abcd".to_vec()).size(), 8);
        assert_eq!(Value::Seq(vec![Value::Str("".to_owned()); 4]).size(), 10);
    }

    #[test]
    fn roundtrip() {
        let (shape, value) = tstruct();
        assert_roundtrip(&shape, value.clone());
        assert_roundtrip(&Shape::Seq(Box::new(shape.clone())), Value::Seq(vec![value.clone(); 3]));
        assert_roundtrip(&Shape::Seq(Box::new(shape)), Value::Seq(vec![]));
        assert_roundtrip(&Shape::Seq(Box::new(Shape::Str)), Value::Seq(["a", "b", "c", "d"].iter().map(|s| Value::Str(s.to_string())).collect()));
        assert_roundtrip(&Shape::Bytes, Value::Bytes(b"hello world".to_vec()));
        assert_roundtrip(&Shape::Struct(vec![Shape::U8, Shape::Struct(vec![Shape::Str, Shape::Bytes])]), Value::Struct(vec![
            Value::U8(42),
            Value::Struct(vec![Value::Str("Üben von Xylophon".to_owned()), Value::Bytes(vec![])]),
        ]));
    }

    #[test]
    fn unsupported_sequences() {
        let mut buf = Buffer::default();
        let value = Value::Seq(vec![Value::U16(1)]);
        assert_eq!(value.size(), 0);
        assert!(matches!(value.encode(&mut buf), Err(Error::Unsupported(_))));
        assert!(buf.is_empty());

        let mut buf = Buffer::new(vec![0, 0]);
        assert!(matches!(Value::decode(&Shape::Seq(Box::new(Shape::U32)), &mut buf), Err(Error::Unsupported(_))));
        assert_eq!(buf.len(), 2);

        let mixed = Value::Seq(vec![Value::Str("a".to_owned()), Value::Struct(vec![])]);
        assert_eq!(mixed.size(), 0);
        assert!(matches!(mixed.encode(&mut Buffer::default()), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn truncated() {
        let (shape, value) = tstruct();
        let mut buf = Buffer::default();
        value.encode(&mut buf).unwrap();
        let mut bytes = buf.into_vec();
        bytes.truncate(20);
        let mut buf = Buffer::new(bytes);
        assert_eq!(Value::decode(&shape, &mut buf), Err(Error::Eof));
        // the error sticks
        assert_eq!(Value::decode(&Shape::U8, &mut buf), Err(Error::Eof));
        assert_eq!(value.encode(&mut buf), Err(Error::Eof));
    }

    #[test]
    fn hostile_count() {
        let mut buf = Buffer::new(vec![0xff, 0xff, 1, 0, b'a']);
        assert_eq!(Value::decode(&Shape::Seq(Box::new(Shape::Str)), &mut buf), Err(Error::Eof));
        assert_eq!(buf.err(), Some(&Error::Eof));
    }

    #[test]
    fn display() {
        let value = Value::Struct(vec![
            Value::U16(7),
            Value::Seq(vec![Value::Str("a\"b".to_owned())]),
            Value::Bytes(vec![1, 2, 3, 4, 255]),
            Value::Seq(vec![]),
        ]);
        assert_eq!(format!("{}", value), "(\n  7u16,\n  [\n    \"a\\\"b\",\n  ],\n  'AQIDBP8=',\n  [],\n)");
        assert_eq!(Shape::Struct(vec![Shape::U8, Shape::Seq(Box::new(Shape::Str))]).to_string(), "(u8 [str])");
    }

}
