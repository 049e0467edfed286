use serde::de::{self, DeserializeSeed, SeqAccess, Visitor};
use std::mem::replace;
use wire9::Buffer;

use crate::context::Context;
use crate::error::{unsupported, Error, Result};

/// Decodes values from the front of a [`Buffer`]. Strings and byte blobs are copied out of the buffer, so the
/// decoded values do not borrow from it.
pub struct Deserializer<'b> {
    buf: &'b mut Buffer,
    ctx: Context,
}

impl<'b> Deserializer<'b> {

    pub fn new(buf: &'b mut Buffer) -> Self {
        Deserializer { buf, ctx: Context::Root }
    }

    /// Surfaces the buffer's sticky error after a read
    #[inline]
    fn checked<T>(&self, v: T) -> Result<T> {
        self.buf.check()?;
        Ok(v)
    }

}

impl<'de, 'a, 'b> de::Deserializer<'de> for &'a mut Deserializer<'b> {
    type Error = Error;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("any value, the format is not self-describing"))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("bool"))
    }

    fn deserialize_i8<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("i8"))
    }

    fn deserialize_i16<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("i16"))
    }

    fn deserialize_i32<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("i32"))
    }

    fn deserialize_i64<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("i64"))
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.ctx.scalar("u8")?;
        let v = self.buf.get_u8();
        visitor.visit_u8(self.checked(v)?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.ctx.scalar("u16")?;
        let v = self.buf.get_u16();
        visitor.visit_u16(self.checked(v)?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.ctx.scalar("u32")?;
        let v = self.buf.get_u32();
        visitor.visit_u32(self.checked(v)?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.ctx.scalar("u64")?;
        let v = self.buf.get_u64();
        visitor.visit_u64(self.checked(v)?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("f32"))
    }

    fn deserialize_f64<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("f64"))
    }

    fn deserialize_char<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("char"))
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let v = self.buf.get_string();
        visitor.visit_string(self.checked(v)?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.ctx.bytes()?;
        let v = self.buf.get_bytes();
        visitor.visit_byte_buf(self.checked(v)?)
    }

    /// The destination of a top level `Option` always exists, so it always decodes as `Some`
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.ctx.option("Option")?;
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        let outer = replace(&mut self.ctx, Context::Field);
        let v = visitor.visit_newtype_struct(&mut *self)?;
        self.ctx = outer;
        Ok(v)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.ctx.seq()?;
        let count = self.buf.get_u16();
        let count = self.checked(count)? as usize;
        visitor.visit_seq(FieldsDeserializer::new(self, Context::Element, count))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(FieldsDeserializer::new(self, Context::Field, len))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(self, _name: &'static str, fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        self.deserialize_tuple(fields.len(), visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(self, name: &'static str, _variants: &'static [&'static str], _visitor: V) -> Result<V::Value> {
        Err(unsupported(format!("enum {}", name)))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("identifier"))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(unsupported("ignored value, the format is not self-describing"))
    }

}

/// Hands out a known number of consecutive values: the fields of a struct or tuple, or the elements of a sequence
struct FieldsDeserializer<'a, 'b: 'a> {
    de: &'a mut Deserializer<'b>,
    ctx: Context,
    remaining: usize,
}

impl<'a, 'b> FieldsDeserializer<'a, 'b> {
    fn new(de: &'a mut Deserializer<'b>, ctx: Context, remaining: usize) -> Self {
        Self { de, ctx, remaining }
    }
}

impl<'de, 'a, 'b> SeqAccess<'de> for FieldsDeserializer<'a, 'b> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let outer = replace(&mut self.de.ctx, self.ctx);
        let v = seed.deserialize(&mut *self.de)?;
        self.de.ctx = outer;
        Ok(Some(v))
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }

}
