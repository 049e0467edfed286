use serde::ser::{self, Serialize};
use std::any::type_name;
use std::mem::replace;
use wire9::wire;

use crate::context::Context;
use crate::error::{invalid, unsupported, Error, Result};

/// Walks a value exactly like the [`Serializer`](crate::Serializer) does, adding up the bytes it would write
/// instead of writing them.
struct Sizer {
    size: usize,
    ctx: Context,
}

/// The number of bytes [`marshal`](crate::marshal) appends for `value`. Never fails: a value that cannot be
/// encoded has size 0.
pub fn size_of<T: ?Sized + Serialize>(value: &T) -> usize {
    let mut sizer = Sizer { size: 0, ctx: Context::Root };
    match value.serialize(&mut sizer) {
        Ok(()) => sizer.size,
        Err(_) => 0,
    }
}

impl Sizer {

    fn add(&mut self, n: usize) -> Result<()> {
        self.size += n;
        Ok(())
    }

    fn nested<T: ?Sized + Serialize>(&mut self, ctx: Context, value: &T) -> Result<()> {
        let outer = replace(&mut self.ctx, ctx);
        value.serialize(&mut *self)?;
        self.ctx = outer;
        Ok(())
    }

}

impl<'a> ser::Serializer for &'a mut Sizer {
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

    fn serialize_u8(self, _v: u8) -> Result<()> {
        self.ctx.scalar("u8")?;
        self.add(1)
    }

    fn serialize_u16(self, _v: u16) -> Result<()> {
        self.ctx.scalar("u16")?;
        self.add(2)
    }

    fn serialize_u32(self, _v: u32) -> Result<()> {
        self.ctx.scalar("u32")?;
        self.add(4)
    }

    fn serialize_u64(self, _v: u64) -> Result<()> {
        self.ctx.scalar("u64")?;
        self.add(8)
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
        wire::string_len(v.len())?;
        self.add(wire::STRING_PREFIX + v.len())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.ctx.bytes()?;
        wire::bytes_len(v.len())?;
        self.add(wire::BYTES_PREFIX + v.len())
    }

    fn serialize_none(self) -> Result<()> {
        self.ctx.option("Option")?;
        Err(invalid("cannot size null pointer"))
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
                wire::seq_len(l)?;
                self.add(wire::SEQ_PREFIX)?;
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

impl<'a> ser::SerializeSeq for &'a mut Sizer {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.nested(Context::Element, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTuple for &'a mut Sizer {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.nested(Context::Field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleStruct for &'a mut Sizer {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.nested(Context::Field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeStruct for &'a mut Sizer {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Result<()> {
        self.nested(Context::Field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::size_of;
    use serde::Serialize;
    use serde_bytes::ByteBuf;

    #[derive(Serialize, Default, Clone)]
    struct Stat {
        kind: u16,
        dev: u32,
        name: String,
    }

    #[test]
    fn scalars_and_strings() {
        assert_eq!(size_of(&u64::MAX), 8);
        assert_eq!(size_of(&0u32), 4);
        assert_eq!(size_of(&0u16), 2);
        assert_eq!(size_of(&0u8), 1);
        assert_eq!(size_of("abcd"), 6);
        assert_eq!(size_of(""), 2);
        assert_eq!(size_of(&ByteBuf::from(b"abcd".to_vec())), 8);
        assert_eq!(size_of(&ByteBuf::new()), 4);
    }

    #[test]
    fn sequences() {
        assert_eq!(size_of(&vec!["a", "b", "c", "d"]), 14);
        assert_eq!(size_of(&vec!["", "", "", ""]), 10);
        assert_eq!(size_of(&Vec::<String>::new()), 2);
        assert_eq!(size_of(&vec![Stat::default(); 0]), 2);
    }

    #[test]
    fn invalid_values_are_skipped() {
        assert_eq!(size_of(&None::<u32>), 0);
        assert_eq!(size_of(&Some(7u32)), 4);
        assert_eq!(size_of(&vec![1u16, 2, 3]), 0);
        assert_eq!(size_of(&vec![Some("a")]), 0);
        assert_eq!(size_of(&-1i32), 0);
        assert_eq!(size_of(&"x".repeat(65536)), 0);
        assert_eq!(size_of(&"x".repeat(65535)), 65537);
    }

}
