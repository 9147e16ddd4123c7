//! Scalar, text and byte-buffer codecs.
//!
//! Native decoders accept null in place of their type and leave the
//! target unchanged.

use std::any::Any;
use std::fmt::Display;
use std::marker::PhantomData;

use bipf_wire::{BipfError, Reader, Result, Writer};

use crate::codec::{Codec, ValueDecoder, ValueEncoder};
use crate::reflect::{downcast_mut, downcast_ref, BytesDesc, FloatKind, IntKind};

pub(crate) fn bool_codec(name: &'static str) -> Codec {
    Codec::new(name, BoolCodec)
}

pub(crate) fn string_codec(name: &'static str) -> Codec {
    Codec::new(name, StringCodec)
}

pub(crate) fn bytes_codec(name: &'static str, desc: &BytesDesc) -> Codec {
    Codec::new(name, BytesCodec { desc: desc.clone() })
}

pub(crate) fn int_codec(name: &'static str, kind: IntKind) -> Codec {
    match kind {
        IntKind::I8 => Codec::new(name, IntCodec::<i8>::new()),
        IntKind::I16 => Codec::new(name, IntCodec::<i16>::new()),
        IntKind::I32 => Codec::new(name, IntCodec::<i32>::new()),
        IntKind::I64 => Codec::new(name, IntCodec::<i64>::new()),
        IntKind::Isize => Codec::new(name, IntCodec::<isize>::new()),
        IntKind::U8 => Codec::new(name, IntCodec::<u8>::new()),
        IntKind::U16 => Codec::new(name, IntCodec::<u16>::new()),
        IntKind::U32 => Codec::new(name, IntCodec::<u32>::new()),
        IntKind::U64 => Codec::new(name, IntCodec::<u64>::new()),
        IntKind::Usize => Codec::new(name, IntCodec::<usize>::new()),
    }
}

pub(crate) fn float_codec(name: &'static str, kind: FloatKind) -> Codec {
    match kind {
        FloatKind::F32 => Codec::new(name, F32Codec),
        FloatKind::F64 => Codec::new(name, F64Codec),
    }
}

struct BoolCodec;

impl ValueEncoder for BoolCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        writer.write_bool(*downcast_ref::<bool>(value)?);
        Ok(())
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok(!*downcast_ref::<bool>(value)?)
    }
}

impl ValueDecoder for BoolCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return Ok(());
        }
        *downcast_mut::<bool>(target)? = reader.read_bool()?;
        Ok(())
    }
}

/// Integer of any width, carried on the wire as INT.
struct IntCodec<T>(PhantomData<fn() -> T>);

impl<T> IntCodec<T> {
    fn new() -> Self {
        IntCodec(PhantomData)
    }
}

impl<T> ValueEncoder for IntCodec<T>
where
    T: Any + Copy + Default + PartialOrd + Display + TryInto<i32>,
{
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        let value = *downcast_ref::<T>(value)?;
        let narrowed = value.try_into().map_err(|_| {
            if value < T::default() {
                BipfError::underflow::<i32>(value)
            } else {
                BipfError::overflow::<i32>(value)
            }
        })?;
        writer.write_i32(narrowed);
        Ok(())
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok(*downcast_ref::<T>(value)? == T::default())
    }
}

impl<T> ValueDecoder for IntCodec<T>
where
    T: Any + TryFrom<i32>,
{
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return Ok(());
        }
        let value = reader.read_int::<T>()?;
        *downcast_mut::<T>(target)? = value;
        Ok(())
    }
}

struct F32Codec;

impl ValueEncoder for F32Codec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        writer.write_f32(*downcast_ref::<f32>(value)?);
        Ok(())
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok(*downcast_ref::<f32>(value)? == 0.0)
    }
}

impl ValueDecoder for F32Codec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return Ok(());
        }
        *downcast_mut::<f32>(target)? = reader.read_f32()?;
        Ok(())
    }
}

struct F64Codec;

impl ValueEncoder for F64Codec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        writer.write_f64(*downcast_ref::<f64>(value)?);
        Ok(())
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok(*downcast_ref::<f64>(value)? == 0.0)
    }
}

impl ValueDecoder for F64Codec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return Ok(());
        }
        *downcast_mut::<f64>(target)? = reader.read_f64()?;
        Ok(())
    }
}

struct StringCodec;

impl ValueEncoder for StringCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        writer.write_string(downcast_ref::<String>(value)?);
        Ok(())
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok(downcast_ref::<String>(value)?.is_empty())
    }
}

impl ValueDecoder for StringCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return Ok(());
        }
        *downcast_mut::<String>(target)? = reader.read_string()?;
        Ok(())
    }
}

struct BytesCodec {
    desc: BytesDesc,
}

impl ValueEncoder for BytesCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        writer.write_buffer((self.desc.get)(value)?);
        Ok(())
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok((self.desc.get)(value)?.is_empty())
    }
}

impl ValueDecoder for BytesCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return Ok(());
        }
        let data = reader.read_buffer()?;
        (self.desc.set)(target, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(codec: &Codec, value: &dyn Any) -> Result<String> {
        let mut writer = Writer::new();
        codec.encode(value, &mut writer)?;
        Ok(hex::encode(writer.as_slice()))
    }

    #[test]
    fn every_int_width_encodes_as_int() {
        let expected = "2264000000";
        assert_eq!(encode(&int_codec("i8", IntKind::I8), &100i8).unwrap(), expected);
        assert_eq!(encode(&int_codec("u16", IntKind::U16), &100u16).unwrap(), expected);
        assert_eq!(encode(&int_codec("i64", IntKind::I64), &100i64).unwrap(), expected);
        assert_eq!(encode(&int_codec("usize", IntKind::Usize), &100usize).unwrap(), expected);
    }

    #[test]
    fn int_range_is_checked() {
        let codec = int_codec("i64", IntKind::I64);
        assert!(matches!(
            encode(&codec, &(i64::from(i32::MAX) + 1)),
            Err(BipfError::Overflow { .. })
        ));
        assert!(matches!(
            encode(&codec, &(i64::from(i32::MIN) - 1)),
            Err(BipfError::Underflow { .. })
        ));

        let codec = int_codec("u32", IntKind::U32);
        assert!(matches!(encode(&codec, &u32::MAX), Err(BipfError::Overflow { .. })));
    }

    #[test]
    fn null_leaves_scalars_unchanged() {
        let codec = string_codec("String");
        let mut value = "kept".to_string();
        codec.decode(&mut value, &mut Reader::new(&[0x06])).unwrap();
        assert_eq!(value, "kept");

        let codec = int_codec("u8", IntKind::U8);
        let mut n = 9u8;
        codec.decode(&mut n, &mut Reader::new(&[0x06])).unwrap();
        assert_eq!(n, 9);
    }

    #[test]
    fn emptiness() {
        assert!(bool_codec("bool").is_empty(&false).unwrap());
        assert!(!bool_codec("bool").is_empty(&true).unwrap());
        assert!(float_codec("f64", FloatKind::F64).is_empty(&0.0f64).unwrap());
        assert!(string_codec("String").is_empty(&String::new()).unwrap());
        assert!(int_codec("i32", IntKind::I32).is_empty(&0i32).unwrap());
    }

    #[test]
    fn wrong_target() {
        let err = bool_codec("bool").encode(&1u8, &mut Writer::new()).unwrap_err();
        assert!(matches!(err, BipfError::WrongTarget { expected: "bool" }));
    }
}
