//! Codecs for [`Value`], [`Interface`] and [`AnyValue`] targets.

use std::any::Any;

use bipf_wire::{BipfError, Reader, Result, Value, Writer};

use crate::codec::{Codec, ValueDecoder, ValueEncoder};
use crate::engine::codec_of_dyn;
use crate::interface::{AnyValue, DynReflect, Interface};
use crate::reflect::{downcast_mut, downcast_ref};

pub(crate) fn value_codec(name: &'static str) -> Codec {
    Codec::new(name, ValueCodec)
}

pub(crate) fn interface_codec(name: &'static str) -> Codec {
    Codec::new(name, InterfaceCodec)
}

pub(crate) fn any_value_codec(name: &'static str) -> Codec {
    Codec::new(name, AnyValueCodec)
}

fn encode_held(holder: &Interface, writer: &mut Writer) -> Result<()> {
    match holder.get() {
        Some(held) => codec_of_dyn(held)?.encode(held.as_any(), writer),
        None => {
            writer.write_nil();
            Ok(())
        }
    }
}

fn decode_held(held: &mut dyn DynReflect, reader: &mut Reader<'_>) -> Result<()> {
    let codec = codec_of_dyn(&*held)?;
    codec.decode(held.as_any_mut(), reader)
}

/// Reject a dynamically typed map key whose runtime value is not scalar.
pub(crate) fn check_dynamic_key(key: &dyn Any) -> Result<()> {
    let unsupported = if let Some(value) = key.downcast_ref::<Value>() {
        value_key_error(value)
    } else if let Some(holder) = key.downcast_ref::<Interface>() {
        held_key_error(holder)
    } else if let Some(slot) = key.downcast_ref::<AnyValue>() {
        held_key_error(slot.as_interface())
    } else {
        return Err(BipfError::WrongTarget {
            expected: "dynamic map key",
        });
    };
    match unsupported {
        Some(name) => Err(BipfError::UnsupportedKeyType(name)),
        None => Ok(()),
    }
}

fn value_key_error(value: &Value) -> Option<&'static str> {
    match value {
        Value::Null => Some("null"),
        Value::Array(_) => Some("array"),
        Value::Object(_) => Some("object"),
        _ => None,
    }
}

fn held_key_error(holder: &Interface) -> Option<&'static str> {
    let held = match holder.get() {
        Some(held) => held,
        None => return Some("nil"),
    };
    if let Some(value) = held.as_any().downcast_ref::<Value>() {
        return value_key_error(value);
    }
    let desc = held.type_desc();
    (!desc.kind.is_key_kind()).then_some(desc.name)
}

/// Any wire value, decoded by its discriminant alone.
struct ValueCodec;

impl ValueEncoder for ValueCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        downcast_ref::<Value>(value)?.write_to(writer)
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok(downcast_ref::<Value>(value)?.is_null())
    }
}

impl ValueDecoder for ValueCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        *downcast_mut::<Value>(target)? = reader.read_any()?;
        Ok(())
    }
}

/// Dispatches on the concrete type held at runtime.
struct InterfaceCodec;

impl ValueEncoder for InterfaceCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        encode_held(downcast_ref::<Interface>(value)?, writer)
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok(downcast_ref::<Interface>(value)?.is_nil())
    }
}

impl ValueDecoder for InterfaceCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        let holder = downcast_mut::<Interface>(target)?;
        if reader.check_nil_is_next()? {
            holder.clear();
            return Ok(());
        }

        let held = holder
            .get_mut()
            .ok_or(BipfError::CannotUnmarshalIntoNil("Interface"))?;
        decode_held(held, reader)
    }
}

/// Held concrete value first, generic [`Value`] otherwise.
struct AnyValueCodec;

impl ValueEncoder for AnyValueCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        encode_held(downcast_ref::<AnyValue>(value)?.as_interface(), writer)
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok(downcast_ref::<AnyValue>(value)?.is_nil())
    }
}

impl ValueDecoder for AnyValueCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        let slot = downcast_mut::<AnyValue>(target)?;
        if reader.check_nil_is_next()? {
            slot.clear();
            return Ok(());
        }

        match slot.as_interface_mut().get_mut() {
            Some(held) => decode_held(held, reader),
            None => {
                slot.set(reader.read_any()?);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::codec_of;

    use super::*;

    #[test]
    fn value_decodes_any_shape() {
        let codec = codec_of::<Value>().unwrap();
        let mut target = Value::Null;
        codec
            .decode(&mut target, &mut Reader::new(&[0x0e, 0x01]))
            .unwrap();
        assert_eq!(target, Value::Bool(true));
        assert!(codec.is_empty(&Value::Null).unwrap());
    }

    #[test]
    fn interface_encodes_held_value() {
        let codec = codec_of::<Interface>().unwrap();

        let mut writer = Writer::new();
        codec.encode(&Interface::new(100u16), &mut writer).unwrap();
        assert_eq!(hex::encode(writer.as_slice()), "2264000000");

        let mut writer = Writer::new();
        codec.encode(&Interface::nil(), &mut writer).unwrap();
        assert_eq!(writer.as_slice(), &[0x06]);
    }

    #[test]
    fn interface_decode_needs_a_held_value() {
        let codec = codec_of::<Interface>().unwrap();
        let input = [0x22, 0x07, 0, 0, 0];

        let mut empty = Interface::nil();
        let err = codec
            .decode(&mut empty, &mut Reader::new(&input))
            .unwrap_err();
        assert!(matches!(err, BipfError::CannotUnmarshalIntoNil(_)));

        let mut held = Interface::new(0i64);
        codec.decode(&mut held, &mut Reader::new(&input)).unwrap();
        assert_eq!(held.downcast_ref::<i64>(), Some(&7));

        codec.decode(&mut held, &mut Reader::new(&[0x06])).unwrap();
        assert!(held.is_nil());
    }

    #[test]
    fn empty_any_value_stores_generic_value() {
        let codec = codec_of::<AnyValue>().unwrap();
        // ["a", 7]
        let input = [0x3c, 0x08, 0x61, 0x22, 0x07, 0, 0, 0];

        let mut slot = AnyValue::nil();
        codec.decode(&mut slot, &mut Reader::new(&input)).unwrap();
        assert_eq!(
            slot.as_value(),
            Some(&Value::Array(vec![Value::from("a"), Value::Int(7)]))
        );

        let mut writer = Writer::new();
        codec.encode(&slot, &mut writer).unwrap();
        assert_eq!(writer.as_slice(), &input);
    }

    #[test]
    fn held_any_value_keeps_its_type() {
        let codec = codec_of::<AnyValue>().unwrap();

        let mut slot = AnyValue::new(Vec::<u16>::new());
        codec
            .decode(&mut slot, &mut Reader::new(&[0x2c, 0x22, 0x03, 0, 0, 0]))
            .unwrap();
        assert_eq!(slot.downcast_ref::<Vec<u16>>(), Some(&vec![3]));
        assert!(slot.as_value().is_none());

        let err = codec
            .decode(&mut slot, &mut Reader::new(&[0x08, 0x61]))
            .unwrap_err();
        assert!(matches!(err.root(), BipfError::TypeMismatch { .. }));

        codec.decode(&mut slot, &mut Reader::new(&[0x06])).unwrap();
        assert!(slot.is_nil());
        assert!(codec.is_empty(&slot).unwrap());
    }
}
