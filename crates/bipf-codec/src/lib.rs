//! Type-directed BIPF encoding and decoding.
//!
//! Types describe their shape through [`Reflect`], usually derived:
//!
//! ```
//! use bipf_codec::Reflect;
//!
//! #[derive(Reflect, Default, Debug, PartialEq)]
//! struct Peer {
//!     #[bipf(rename = "id")]
//!     key: String,
//!     port: u16,
//!     #[bipf(omit_empty)]
//!     tags: Vec<String>,
//! }
//!
//! let peer = Peer { key: "@abc".into(), port: 8008, tags: vec![] };
//! let bytes = bipf_codec::to_bytes(&peer).unwrap();
//!
//! let mut decoded = Peer::default();
//! bipf_codec::from_bytes(&bytes, &mut decoded).unwrap();
//! assert_eq!(decoded, peer);
//! ```
//!
//! The first use of a type builds a [`Codec`] for it and every type it
//! contains; codecs are cached for the life of the process.

extern crate self as bipf_codec;

pub mod capability;
mod codec;
mod codecs;
mod descriptor;
mod engine;
mod impls;
mod interface;
pub mod reflect;

pub use bipf_derive::Reflect;
pub use bipf_wire::{
    BipfError, BoxError, Discriminant, Reader, ReaderConfig, Result, Value, Writer, WriterConfig,
};

pub use capability::{BinaryMarshal, BinaryUnmarshal, Marshal, Unmarshal};
pub use codec::{Codec, ValueDecoder, ValueEncoder};
pub use descriptor::{FieldBinding, StructDescriptor};
pub use engine::{codec_for, codec_of, codec_of_dyn, descriptor_of};
pub use impls::ByteBuf;
pub use interface::{AnyValue, DynReflect, Interface};
pub use reflect::{Kind, Reflect, TypeDesc};

/// Encode `value` into a new buffer.
pub fn to_bytes<T: Reflect>(value: &T) -> Result<Vec<u8>> {
    to_bytes_with_config(value, &WriterConfig::default())
}

pub fn to_bytes_with_config<T: Reflect>(value: &T, config: &WriterConfig) -> Result<Vec<u8>> {
    let mut writer = Writer::with_config(config);
    encode_into(value, &mut writer)?;
    Ok(writer.into_vec())
}

/// Append the encoding of `value` to `writer`.
pub fn encode_into<T: Reflect>(value: &T, writer: &mut Writer) -> Result<()> {
    codec_of::<T>()?.encode(value, writer)
}

/// Decode one value from `data` into `target`, requiring all input to be consumed.
///
/// Errors carry the byte offset and surrounding bytes of the failure.
pub fn from_bytes<T: Reflect>(data: &[u8], target: &mut T) -> Result<()> {
    from_bytes_with_config(data, target, ReaderConfig::default())
}

pub fn from_bytes_with_config<T: Reflect>(
    data: &[u8],
    target: &mut T,
    config: ReaderConfig,
) -> Result<()> {
    let mut reader = Reader::with_config(data, config);
    decode_from(&mut reader, target)
        .and_then(|()| reader.finish())
        .map_err(|err| reader.annotate(err))
}

/// Decode the next value from `reader` into `target`, leaving any remaining input.
pub fn decode_from<T: Reflect>(reader: &mut Reader<'_>, target: &mut T) -> Result<()> {
    let codec = codec_of::<T>()?;
    let depth = reader.depth();
    codec.decode(target, reader)?;
    if reader.depth() != depth {
        return Err(BipfError::UnbalancedNesting);
    }
    Ok(())
}
