use serde::{ser, Serialize};
use std::any::type_name;
use std::mem::replace;
use wire9::{wire, Buffer};

use crate::context::Context;
use crate::error::{invalid, unsupported, Error, Result};

/// Encodes values onto the end of a [`Buffer`].
pub struct Serializer<'b> {
    buf: &'b mut Buffer,
    ctx: Context,
    /// Name of the top level type, used to report a top level `None`
    root: &'static str,
}

impl<'b> Serializer<'b> {

    pub fn new(buf: &'b mut Buffer) -> Self {
        Self::with_root(buf, "value")
    }

    pub(crate) fn with_root(buf: &'b mut Buffer, root: &'static str) -> Self {
        Serializer { buf, ctx: Context::Root, root }
    }

    fn nested<T: ?Sized + Serialize>(&mut self, ctx: Context, value: &T) -> Result<()> {
        let outer = replace(&mut self.ctx, ctx);
        value.serialize(&mut *self)?;
        self.ctx = outer;
        Ok(())
    }

}

impl<'a, 'b> ser::Serializer for &'a mut Serializer<'b> {

    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, _v: bool) -> Result<()> {
        Err(unsupported("bool"))
    }

    fn serialize_i8(self, _v: i8) -> Result<()> {
        Err(unsupported("i8"))
    }

    fn serialize_i16(self, _v: i16) -> Result<()> {
        Err(unsupported("i16"))
    }

    fn serialize_i32(self, _v: i32) -> Result<()> {
        Err(unsupported("i32"))
    }

    fn serialize_i64(self, _v: i64) -> Result<()> {
        Err(unsupported("i64"))
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.ctx.scalar("u8")?;
        self.buf.put_u8(v);
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.ctx.scalar("u16")?;
        self.buf.put_u16(v);
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.ctx.scalar("u32")?;
        self.buf.put_u32(v);
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.ctx.scalar("u64")?;
        self.buf.put_u64(v);
        Ok(())
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(unsupported("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(unsupported("f64"))
    }

    fn serialize_char(self, _v: char) -> Result<()> {
        Err(unsupported("char"))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.buf.put_string(v);
        Ok(self.buf.check()?)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.ctx.bytes()?;
        self.buf.put_bytes(v);
        Ok(self.buf.check()?)
    }

    fn serialize_none(self) -> Result<()> {
        self.ctx.option("Option")?;
        Err(invalid(format!("cannot encode null pointer {}", self.root)))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        self.ctx.option(&format!("Option<{}>", type_name::<T>()))?;
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(self, name: &'static str, _index: u32, _variant: &'static str) -> Result<()> {
        Err(unsupported(format!("enum {}", name)))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<()> {
        self.nested(Context::Field, value)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, name: &'static str, _index: u32, _variant: &'static str, _value: &T) -> Result<()> {
        Err(unsupported(format!("enum {}", name)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.ctx.seq()?;
        match len {
            Some(l) => {
                self.buf.put_u16(wire::seq_len(l)?);
                Ok(self)
            },
            None => Err(invalid("sequence of unknown length")),
        }
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
        Ok(self)
    }

    fn serialize_tuple_variant(self, name: &'static str, _index: u32, _variant: &'static str, _len: usize) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported(format!("enum {}", name)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    fn serialize_struct_variant(self, name: &'static str, _index: u32, _variant: &'static str, _len: usize) -> Result<Self::SerializeStructVariant> {
        Err(unsupported(format!("enum {}", name)))
    }

}

impl<'a, 'b> ser::SerializeSeq for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.nested(Context::Element, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}

impl<'a, 'b> ser::SerializeTuple for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.nested(Context::Field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeTupleStruct for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.nested(Context::Field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeStruct for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Result<()> {
        self.nested(Context::Field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}
