use std::fmt::{Display, Formatter, self};

/// Errors raised while encoding or decoding values. This is the type stored in a [`Buffer`](crate::Buffer)'s sticky
/// error slot, which is why it is `Clone`: every call after the first failure hands out a copy of the same error.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A fixed width or a declared length exceeds the remaining input
    Eof,
    /// The bytes of a string are not valid UTF-8
    InvalidUtf8,
    /// The value has no representation in the wire format
    Unsupported(String),
    /// The value cannot be encoded as given, e.g. a string longer than its length prefix allows
    InvalidArgument(String),
    /// A custom error raised by a type's own encoding logic
    Message(String),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::Eof => f.write_str("Unexpected end of input"),
            Error::InvalidUtf8 => f.write_str("String is not valid Utf-8"),
            Error::Unsupported(t) => write!(f, "Cannot encode or decode type {}", t),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::Message(msg) => f.write_str(msg),
        }
    }
}

/// Errors raised while draining a [`Buffer`](crate::Buffer) into a sink.
#[derive(Debug)]
pub enum DrainError {
    /// There was nothing left to drain
    Empty,
    /// The sink accepted fewer bytes than it was offered
    ShortWrite { written: usize, expected: usize },
    Io(std::io::Error),
}

impl From<std::io::Error> for DrainError {
    fn from(e: std::io::Error) -> DrainError {
        DrainError::Io(e)
    }
}

impl std::error::Error for DrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DrainError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for DrainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DrainError::Empty => f.write_str("Buffer is empty"),
            DrainError::ShortWrite { written, expected } => write!(f, "Short write: {} of {} bytes", written, expected),
            DrainError::Io(e) => write!(f, "IO error {}", e),
        }
    }
}
