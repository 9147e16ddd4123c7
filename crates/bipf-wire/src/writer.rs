use bytes::{BufMut, Bytes, BytesMut};

use crate::config::WriterConfig;
use crate::error::{BipfError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::tag::{put_tag, Discriminant, Tag};

/// Append-only BIPF output buffer.
///
/// Composites are written in two passes: children go to a scratch writer,
/// then the composite tag carrying the scratch length is appended, then the
/// scratch contents.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
}

impl Writer {
    /// Create a writer with default configuration.
    pub fn new() -> Self {
        Self::with_config(&WriterConfig::default())
    }

    /// Create a writer with explicit configuration.
    pub fn with_config(config: &WriterConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.initial_capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    pub fn write_tag(&mut self, discriminant: Discriminant, length: u64) {
        put_tag(&mut self.buf, Tag::new(discriminant, length));
    }

    pub fn write_nil(&mut self) {
        self.write_tag(Discriminant::BoolNull, 0);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_tag(Discriminant::BoolNull, 1);
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_tag(Discriminant::Int, 4);
        self.buf.put_i32_le(value);
    }

    /// Write a signed integer, failing if it is outside the INT range.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        let narrowed = i32::try_from(value).map_err(|_| {
            if value < 0 {
                BipfError::underflow::<i32>(value)
            } else {
                BipfError::overflow::<i32>(value)
            }
        })?;
        self.write_i32(narrowed);
        Ok(())
    }

    /// Write an unsigned integer, failing if it is above `i32::MAX`.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let narrowed = i32::try_from(value).map_err(|_| BipfError::overflow::<i32>(value))?;
        self.write_i32(narrowed);
        Ok(())
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_tag(Discriminant::Double, 8);
        self.buf.put_f64_le(value);
    }

    /// `f32` is widened; the wire has no single-precision type.
    pub fn write_f32(&mut self, value: f32) {
        self.write_f64(f64::from(value));
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_str_bytes(value.as_bytes());
    }

    /// Write a STRING from raw bytes. The bytes are not validated as UTF-8.
    pub fn write_str_bytes(&mut self, value: &[u8]) {
        self.write_tag(Discriminant::String, value.len() as u64);
        self.buf.put_slice(value);
    }

    pub fn write_buffer(&mut self, value: &[u8]) {
        self.write_tag(Discriminant::Buffer, value.len() as u64);
        self.buf.put_slice(value);
    }

    /// Append already-encoded BIPF bytes verbatim.
    pub fn write_raw(&mut self, encoded: &[u8]) {
        self.buf.put_slice(encoded);
    }

    pub fn write_empty_array(&mut self) {
        self.write_tag(Discriminant::Array, 0);
    }

    pub fn write_empty_object(&mut self) {
        self.write_tag(Discriminant::Object, 0);
    }

    /// Write an ARRAY whose elements are produced by `children`.
    pub fn write_array<F>(&mut self, children: F) -> Result<()>
    where
        F: FnOnce(&mut Writer) -> Result<()>,
    {
        self.write_composite(Discriminant::Array, children)
    }

    /// Write an OBJECT whose key/value pairs are produced by `children`.
    pub fn write_object<F>(&mut self, children: F) -> Result<()>
    where
        F: FnOnce(&mut Writer) -> Result<()>,
    {
        self.write_composite(Discriminant::Object, children)
    }

    /// Two-pass composite write. Nothing is appended to `self` if `children` fails.
    pub fn write_composite<F>(&mut self, discriminant: Discriminant, children: F) -> Result<()>
    where
        F: FnOnce(&mut Writer) -> Result<()>,
    {
        let mut scratch = Writer {
            buf: BytesMut::new(),
        };
        ensure_sufficient_stack(|| children(&mut scratch))?;

        let tag = Tag::new(discriminant, scratch.len() as u64);
        self.buf.reserve(tag.encoded_len() + scratch.len());
        put_tag(&mut self.buf, tag);
        self.buf.put_slice(&scratch.buf);
        Ok(())
    }
}
