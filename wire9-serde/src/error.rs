use std::fmt::{self, Display};
use serde::{de, ser};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An error of the underlying codec, also recorded as the buffer's sticky error
    Codec(wire9::Error),
    /// The input holds this many bytes beyond the decoded value
    Trailing(usize),
}

impl Error {

    /// The codec error behind this error. Trailing input counts as an invalid argument.
    pub fn into_inner(self) -> wire9::Error {
        match self {
            Error::Codec(e) => e,
            Error::Trailing(n) => wire9::Error::InvalidArgument(format!("{} trailing bytes in input", n)),
        }
    }

}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Codec(wire9::Error::Message(msg.to_string()))
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Codec(wire9::Error::Message(msg.to_string()))
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Codec(e) => Display::fmt(e, fmt),
            Error::Trailing(n) => write!(fmt, "Trailing {} bytes in input", n),
        }
    }
}

impl From<wire9::Error> for Error {
    fn from(e: wire9::Error) -> Error {
        Error::Codec(e)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Codec(e) => Some(e),
            Error::Trailing(_) => None,
        }
    }
}

/// Unsupported shapes are reported with the name of the offending type
pub(crate) fn unsupported(name: impl Into<String>) -> Error {
    Error::Codec(wire9::Error::Unsupported(name.into()))
}

pub(crate) fn invalid(msg: impl Into<String>) -> Error {
    Error::Codec(wire9::Error::InvalidArgument(msg.into()))
}
