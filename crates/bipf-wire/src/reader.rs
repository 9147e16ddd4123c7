use std::any::type_name;

use bytes::Bytes;

use crate::config::ReaderConfig;
use crate::error::{BipfError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::tag::{read_uvarint, Discriminant, Tag, NULL_BYTE};
use crate::value::Value;

/// Bounds-checked cursor over one encoded BIPF input.
///
/// A reader is scoped to a single decode. It tracks the cursor and the
/// composite nesting depth; the depth is bounded by
/// [`ReaderConfig::max_depth`].
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
    config: ReaderConfig,
}

impl<'a> Reader<'a> {
    /// Create a reader with default configuration.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, ReaderConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(data: &'a [u8], config: ReaderConfig) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
            config,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Current composite nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(BipfError::EndOfInput)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Step back over the last byte read.
    pub fn unread_byte(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_exact(&mut self, len: u64) -> Result<&'a [u8]> {
        let len = usize::try_from(len).map_err(|_| BipfError::EndOfInput)?;
        if len > self.remaining() {
            return Err(BipfError::EndOfInput);
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..self.pos])
    }

    pub fn read_tag(&mut self) -> Result<Tag> {
        let raw = read_uvarint(|| self.read_byte())?;
        Ok(Tag::from_raw(raw))
    }

    /// Read the next tag without consuming it.
    pub fn peek_tag(&mut self) -> Result<Tag> {
        let start = self.pos;
        let tag = self.read_tag();
        self.pos = start;
        tag
    }

    /// Discriminant of the next value, read from the first tag byte only.
    pub fn peek_discriminant(&mut self) -> Result<Discriminant> {
        let byte = self.read_byte()?;
        self.unread_byte();
        Ok(Discriminant::from_bits(byte))
    }

    /// Read a tag and require the given discriminant.
    pub fn expect_tag(&mut self, expected: Discriminant) -> Result<Tag> {
        let tag = self.read_tag()?;
        if tag.discriminant != expected {
            return Err(BipfError::TypeMismatch {
                expected,
                found: tag.discriminant,
            });
        }
        Ok(tag)
    }

    /// Consume the next byte if it is the single-byte null, otherwise leave it.
    pub fn check_nil_is_next(&mut self) -> Result<bool> {
        if self.read_byte()? == NULL_BYTE {
            return Ok(true);
        }
        self.unread_byte();
        Ok(false)
    }

    pub fn read_nil(&mut self) -> Result<()> {
        if self.read_byte()? == NULL_BYTE {
            Ok(())
        } else {
            self.unread_byte();
            Err(BipfError::NotNull)
        }
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let tag = self.expect_tag(Discriminant::BoolNull)?;
        if tag.length != 1 {
            return Err(BipfError::InvalidLength {
                discriminant: Discriminant::BoolNull,
                expected: 1,
                found: tag.length,
            });
        }
        match self.read_byte()? {
            0x00 => Ok(false),
            0x01 => Ok(true),
            other => Err(BipfError::InvalidBool(other)),
        }
    }

    /// STRING payload bytes. Not validated as UTF-8.
    pub fn read_str_bytes(&mut self) -> Result<&'a [u8]> {
        let tag = self.expect_tag(Discriminant::String)?;
        self.read_exact(tag.length)
    }

    /// STRING payload as text; invalid UTF-8 sequences are replaced.
    pub fn read_string(&mut self) -> Result<String> {
        let raw = self.read_str_bytes()?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    pub fn read_buffer(&mut self) -> Result<&'a [u8]> {
        let tag = self.expect_tag(Discriminant::Buffer)?;
        self.read_exact(tag.length)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let tag = self.expect_tag(Discriminant::Int)?;
        let payload = self.read_fixed::<4>(tag)?;
        Ok(i32::from_le_bytes(payload))
    }

    /// Read an INT and narrow it into `T`.
    pub fn read_int<T>(&mut self) -> Result<T>
    where
        T: TryFrom<i32>,
    {
        let value = self.read_i32()?;
        T::try_from(value).map_err(|_| {
            let target = type_name::<T>();
            if value < 0 {
                BipfError::Underflow {
                    value: value.to_string(),
                    target,
                }
            } else {
                BipfError::Overflow {
                    value: value.to_string(),
                    target,
                }
            }
        })
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let tag = self.expect_tag(Discriminant::Double)?;
        let payload = self.read_fixed::<8>(tag)?;
        Ok(f64::from_le_bytes(payload))
    }

    /// Read a DOUBLE and narrow it to single precision.
    ///
    /// Finite values whose magnitude exceeds `f32::MAX` are rejected;
    /// infinities and NaN pass through.
    pub fn read_f32(&mut self) -> Result<f32> {
        let value = self.read_f64()?;
        if value.is_finite() && value > f64::from(f32::MAX) {
            return Err(BipfError::overflow::<f32>(value));
        }
        if value.is_finite() && value < f64::from(f32::MIN) {
            return Err(BipfError::underflow::<f32>(value));
        }
        Ok(value as f32)
    }

    fn read_fixed<const N: usize>(&mut self, tag: Tag) -> Result<[u8; N]> {
        if tag.length != N as u64 {
            return Err(BipfError::InvalidLength {
                discriminant: tag.discriminant,
                expected: N as u64,
                found: tag.length,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N as u64)?);
        Ok(out)
    }

    /// Enter one composite level.
    pub fn increment_depth(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(BipfError::MaxDepthExceeded(self.config.max_depth));
        }
        Ok(())
    }

    /// Leave one composite level.
    pub fn decrement_depth(&mut self) -> Result<()> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or(BipfError::UnbalancedNesting)?;
        Ok(())
    }

    /// Drive `child` over the payload of an already-read composite tag until
    /// exactly `tag.length` bytes have been consumed.
    ///
    /// Empty composites do not count toward the nesting depth.
    pub fn read_children<F>(&mut self, tag: Tag, mut child: F) -> Result<()>
    where
        F: FnMut(&mut Reader<'a>) -> Result<()>,
    {
        if tag.length == 0 {
            return Ok(());
        }
        self.increment_depth()?;

        let start = self.pos as u64;
        while (self.pos as u64) - start < tag.length {
            ensure_sufficient_stack(|| child(self))?;

            let consumed = (self.pos as u64) - start;
            if consumed > tag.length {
                return Err(BipfError::OutOfBounds {
                    declared: tag.length,
                    consumed,
                });
            }
        }

        self.decrement_depth()
    }

    /// Read an ARRAY, calling `element` once per element.
    pub fn read_array_cb<F>(&mut self, element: F) -> Result<()>
    where
        F: FnMut(&mut Reader<'a>) -> Result<()>,
    {
        let tag = self.expect_tag(Discriminant::Array)?;
        self.read_children(tag, element)
    }

    /// Read an OBJECT, calling `pair` once per key/value pair.
    ///
    /// The callback must consume both the key and the value.
    pub fn read_object_cb<F>(&mut self, pair: F) -> Result<()>
    where
        F: FnMut(&mut Reader<'a>) -> Result<()>,
    {
        let tag = self.expect_tag(Discriminant::Object)?;
        self.read_children(tag, pair)
    }

    /// Consume the next value: its tag and its declared payload length.
    pub fn skip(&mut self) -> Result<()> {
        let tag = self.read_tag()?;
        self.read_exact(tag.length)?;
        Ok(())
    }

    /// The full encoding of the next value, tag included.
    pub fn read_raw_value(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        self.skip()?;
        Ok(&self.data[start..self.pos])
    }

    /// Decode the next value by its discriminant alone.
    pub fn read_any(&mut self) -> Result<Value> {
        match self.peek_discriminant()? {
            Discriminant::String => self.read_string().map(Value::String),
            Discriminant::Buffer => self
                .read_buffer()
                .map(|raw| Value::Buffer(Bytes::copy_from_slice(raw))),
            Discriminant::Int => self.read_i32().map(Value::Int),
            Discriminant::Double => self.read_f64().map(Value::Double),
            Discriminant::Array => {
                let mut items = Vec::new();
                self.read_array_cb(|r| {
                    items.push(r.read_any()?);
                    Ok(())
                })?;
                Ok(Value::Array(items))
            }
            Discriminant::Object => {
                let mut pairs = Vec::new();
                self.read_object_cb(|r| {
                    let key = r.read_any()?;
                    let value = r.read_any()?;
                    pairs.push((key, value));
                    Ok(())
                })?;
                Ok(Value::Object(pairs))
            }
            Discriminant::BoolNull => {
                if self.check_nil_is_next()? {
                    Ok(Value::Null)
                } else {
                    self.read_bool().map(Value::Bool)
                }
            }
            Discriminant::Extended => {
                Err(BipfError::UnsupportedDiscriminant(Discriminant::Extended))
            }
        }
    }

    /// Require that the whole input has been consumed.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(BipfError::TrailingBytes(n)),
        }
    }

    /// Attach the bytes around the cursor to `err` for diagnostics.
    ///
    /// Already-annotated errors are returned unchanged.
    pub fn annotate(&self, err: BipfError) -> BipfError {
        if err.is_annotated() {
            return err;
        }
        BipfError::Annotated {
            offset: self.pos,
            window: self.hex_around(self.config.annotate_window),
            context: self.hex_around(self.config.context_window),
            source: Box::new(err),
        }
    }

    fn hex_around(&self, radius: usize) -> String {
        let pos = self.pos.min(self.data.len());
        let start = pos.saturating_sub(radius);
        let end = pos.saturating_add(radius).min(self.data.len());
        self.data[start..end]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
