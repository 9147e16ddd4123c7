use std::fmt;

use bytes::BufMut;

use crate::error::{BipfError, Result};

/// Number of low bits of a tag that carry the discriminant.
pub const TAG_BITS: u32 = 3;

/// Mask selecting the discriminant bits of a tag.
pub const DISCRIMINANT_MASK: u8 = 0b111;

/// The single byte encoding BOOLNULL with length 0, i.e. null.
pub const NULL_BYTE: u8 = 0x06;

/// Longest possible encoding of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Value type carried in the low three bits of every tag.
///
/// ```text
/// ┌──────────────────────────────┬─────────────────┐
/// │ length (varint high bits)    │ discriminant 3b │
/// └──────────────────────────────┴─────────────────┘
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discriminant {
    String = 0b000,
    Buffer = 0b001,
    Int = 0b010,
    Double = 0b011,
    Array = 0b100,
    Object = 0b101,
    BoolNull = 0b110,
    Extended = 0b111,
}

impl Discriminant {
    /// Extract the discriminant from the low bits of a tag byte or varint.
    pub fn from_bits(bits: u8) -> Self {
        match bits & DISCRIMINANT_MASK {
            0b000 => Discriminant::String,
            0b001 => Discriminant::Buffer,
            0b010 => Discriminant::Int,
            0b011 => Discriminant::Double,
            0b100 => Discriminant::Array,
            0b101 => Discriminant::Object,
            0b110 => Discriminant::BoolNull,
            _ => Discriminant::Extended,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Discriminant::String => "STRING",
            Discriminant::Buffer => "BUFFER",
            Discriminant::Int => "INT",
            Discriminant::Double => "DOUBLE",
            Discriminant::Array => "ARRAY",
            Discriminant::Object => "OBJECT",
            Discriminant::BoolNull => "BOOLNULL",
            Discriminant::Extended => "EXTENDED",
        }
    }

    /// True for ARRAY and OBJECT, whose length covers encoded children.
    pub fn is_composite(self) -> bool {
        matches!(self, Discriminant::Array | Discriminant::Object)
    }
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded tag: discriminant plus payload byte length.
///
/// The length is always a byte count, never an element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub discriminant: Discriminant,
    pub length: u64,
}

impl Tag {
    pub fn new(discriminant: Discriminant, length: u64) -> Self {
        Self {
            discriminant,
            length,
        }
    }

    /// The BOOLNULL tag with length 0.
    pub fn null() -> Self {
        Self::new(Discriminant::BoolNull, 0)
    }

    pub fn is_null(&self) -> bool {
        self.discriminant == Discriminant::BoolNull && self.length == 0
    }

    /// Combine into the raw varint value `length << 3 | discriminant`.
    pub fn to_raw(self) -> u64 {
        (self.length << TAG_BITS) | self.discriminant as u64
    }

    /// Split a raw varint value.
    pub fn from_raw(raw: u64) -> Self {
        Self {
            discriminant: Discriminant::from_bits(raw as u8),
            length: raw >> TAG_BITS,
        }
    }

    /// Number of bytes this tag occupies on the wire.
    pub fn encoded_len(self) -> usize {
        uvarint_len(self.to_raw())
    }
}

/// Append a tag as a varint.
pub fn put_tag(dst: &mut impl BufMut, tag: Tag) {
    put_uvarint(dst, tag.to_raw());
}

/// Append an unsigned LEB128 varint.
pub fn put_uvarint(dst: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        dst.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

/// Encoded size of an unsigned varint.
pub fn uvarint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode an unsigned varint, pulling bytes from `next_byte`.
///
/// Fails with `MalformedVarint` if the value does not fit in 64 bits and
/// propagates whatever `next_byte` returns (normally `EndOfInput`).
pub fn read_uvarint(mut next_byte: impl FnMut() -> Result<u8>) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for i in 0..MAX_VARINT_LEN {
        let byte = next_byte()?;
        if byte < 0x80 {
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return Err(BipfError::MalformedVarint);
            }
            return Ok(value | (u64::from(byte) << shift));
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    Err(BipfError::MalformedVarint)
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    fn decode(bytes: &[u8]) -> Result<u64> {
        let mut iter = bytes.iter().copied();
        read_uvarint(|| iter.next().ok_or(BipfError::EndOfInput))
    }

    #[test]
    fn tag_layout() {
        let tag = Tag::new(Discriminant::String, 5);
        assert_eq!(tag.to_raw(), 0x28);
        assert_eq!(Tag::from_raw(0x28), tag);
        assert_eq!(Tag::null().to_raw(), u64::from(NULL_BYTE));
        assert!(Tag::from_raw(0x06).is_null());
        assert!(!Tag::new(Discriminant::BoolNull, 1).is_null());
    }

    #[test]
    fn int_tag_is_single_byte() {
        let mut buf = BytesMut::new();
        put_tag(&mut buf, Tag::new(Discriminant::Int, 4));
        assert_eq!(buf.as_ref(), &[0x22]);
    }

    #[test]
    fn multi_byte_tag() {
        // 9 ints of 5 bytes each: length 45, ARRAY.
        let mut buf = BytesMut::new();
        put_tag(&mut buf, Tag::new(Discriminant::Array, 45));
        assert_eq!(buf.as_ref(), &[0xec, 0x02]);
        assert_eq!(Tag::new(Discriminant::Array, 45).encoded_len(), 2);
    }

    #[test]
    fn varint_boundaries() {
        for value in [0u64, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            let mut buf = BytesMut::new();
            put_uvarint(&mut buf, value);
            assert_eq!(buf.len(), uvarint_len(value), "len of {value}");
            assert_eq!(decode(&buf).unwrap(), value);
        }
    }

    #[test]
    fn varint_truncated() {
        assert!(matches!(decode(&[0x80, 0x80]), Err(BipfError::EndOfInput)));
        assert!(matches!(decode(&[]), Err(BipfError::EndOfInput)));
    }

    #[test]
    fn varint_too_long() {
        let bytes = [0xff; 11];
        assert!(matches!(decode(&bytes), Err(BipfError::MalformedVarint)));

        let mut overflow = [0xff; 10];
        overflow[9] = 0x02;
        assert!(matches!(decode(&overflow), Err(BipfError::MalformedVarint)));
    }

    #[test]
    fn discriminant_names() {
        assert_eq!(Discriminant::from_bits(0x0e), Discriminant::BoolNull);
        assert_eq!(Discriminant::Extended.to_string(), "EXTENDED");
        assert!(Discriminant::Object.is_composite());
        assert!(!Discriminant::Buffer.is_composite());
    }
}
