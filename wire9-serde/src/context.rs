//! Which shapes are allowed depends on where a value sits: only strings and structs may be elements of a
//! sequence, and an `Option` stands for a pointer, which is only dereferenced at the top level of a call. The
//! serializer, the deserializer and the size calculator all consult the same rules so that they never disagree on
//! what can be encoded.

use crate::error::{unsupported, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Context {
    /// The value handed to `marshal`, `unmarshal` or `size_of` itself
    Root,
    /// A field of a struct, tuple or newtype
    Field,
    /// An element of a sequence
    Element,
}

impl Context {

    /// Integers cannot be sequence elements
    pub(crate) fn scalar(self, name: &str) -> Result<()> {
        match self {
            Context::Element => Err(unsupported(format!("sequence of {}", name))),
            _ => Ok(()),
        }
    }

    /// Byte blobs cannot be sequence elements
    pub(crate) fn bytes(self) -> Result<()> {
        match self {
            Context::Element => Err(unsupported("sequence of byte blobs")),
            _ => Ok(()),
        }
    }

    /// Sequences cannot be sequence elements
    pub(crate) fn seq(self) -> Result<()> {
        match self {
            Context::Element => Err(unsupported("sequence of sequences")),
            _ => Ok(()),
        }
    }

    /// Options are only dereferenced at the top level
    pub(crate) fn option(self, name: &str) -> Result<()> {
        match self {
            Context::Root => Ok(()),
            Context::Field => Err(unsupported(format!("field of type {}", name))),
            Context::Element => Err(unsupported(format!("sequence of pointers ({})", name))),
        }
    }

}
