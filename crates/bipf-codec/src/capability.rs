//! Extension capabilities for types that encode themselves.
//!
//! A type opts in with a container attribute on its derive
//! (`#[bipf(marshal)]`, `#[bipf(binary)]` or `#[bipf(text)]`) or by
//! returning one of the descriptors below from a hand-written
//! [`Reflect`](crate::Reflect) impl. Capability types take precedence over
//! every built-in codec and are valid map keys.

use std::any::Any;
use std::fmt::Display;
use std::str::FromStr;

use bipf_wire::{BipfError, BoxError, Reader, Result, Writer};

use crate::reflect::{downcast_mut, downcast_ref, Capability, CustomDesc};

/// Produce one complete BIPF value, tag included. It is written verbatim.
pub trait Marshal {
    fn marshal_bipf(&self) -> std::result::Result<Vec<u8>, BoxError>;
}

/// Consume one complete BIPF value, tag included. Null arrives as `06`.
pub trait Unmarshal {
    fn unmarshal_bipf(&mut self, raw: &[u8]) -> std::result::Result<(), BoxError>;
}

/// Produce opaque bytes, carried as a BUFFER.
pub trait BinaryMarshal {
    fn marshal_binary(&self) -> std::result::Result<Vec<u8>, BoxError>;
}

/// Consume the payload of a BUFFER.
pub trait BinaryUnmarshal {
    fn unmarshal_binary(&mut self, data: &[u8]) -> std::result::Result<(), BoxError>;
}

pub fn marshal_desc<T>() -> CustomDesc
where
    T: Marshal + Unmarshal + Any,
{
    CustomDesc {
        capability: Capability::Marshal,
        encode: marshal_encode::<T>,
        decode: marshal_decode::<T>,
    }
}

pub fn binary_desc<T>() -> CustomDesc
where
    T: BinaryMarshal + BinaryUnmarshal + Any,
{
    CustomDesc {
        capability: Capability::Binary,
        encode: binary_encode::<T>,
        decode: binary_decode::<T>,
    }
}

pub fn text_desc<T>() -> CustomDesc
where
    T: Display + FromStr + Any,
    T::Err: Into<BoxError>,
{
    CustomDesc {
        capability: Capability::Text,
        encode: text_encode::<T>,
        decode: text_decode::<T>,
    }
}

fn marshal_encode<T: Marshal + Any>(value: &dyn Any, writer: &mut Writer) -> Result<()> {
    let raw = downcast_ref::<T>(value)?
        .marshal_bipf()
        .map_err(BipfError::custom)?;
    writer.write_raw(&raw);
    Ok(())
}

fn marshal_decode<T: Unmarshal + Any>(target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
    let raw = reader.read_raw_value()?;
    downcast_mut::<T>(target)?
        .unmarshal_bipf(raw)
        .map_err(BipfError::custom)
}

fn binary_encode<T: BinaryMarshal + Any>(value: &dyn Any, writer: &mut Writer) -> Result<()> {
    let data = downcast_ref::<T>(value)?
        .marshal_binary()
        .map_err(BipfError::custom)?;
    writer.write_buffer(&data);
    Ok(())
}

fn binary_decode<T: BinaryUnmarshal + Any>(
    target: &mut dyn Any,
    reader: &mut Reader<'_>,
) -> Result<()> {
    if reader.check_nil_is_next()? {
        return Ok(());
    }
    let data = reader.read_buffer()?;
    downcast_mut::<T>(target)?
        .unmarshal_binary(data)
        .map_err(BipfError::custom)
}

fn text_encode<T: Display + Any>(value: &dyn Any, writer: &mut Writer) -> Result<()> {
    writer.write_string(&downcast_ref::<T>(value)?.to_string());
    Ok(())
}

fn text_decode<T>(target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()>
where
    T: FromStr + Any,
    T::Err: Into<BoxError>,
{
    if reader.check_nil_is_next()? {
        return Ok(());
    }
    let text = reader.read_string()?;
    *downcast_mut::<T>(target)? = text.parse::<T>().map_err(BipfError::custom)?;
    Ok(())
}
