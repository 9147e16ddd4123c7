//! Pointer-like codecs: `Option<T>` and `Box<T>`.

use std::any::Any;

use bipf_wire::{Reader, Result, Writer};

use crate::codec::{Codec, ValueDecoder, ValueEncoder};
use crate::engine::BuildContext;
use crate::reflect::{BoxedDesc, OptionalDesc};

pub(crate) fn build(
    ctx: &mut BuildContext,
    name: &'static str,
    desc: &OptionalDesc,
) -> Result<Codec> {
    let inner = ctx.codec(&(desc.inner)())?;
    Ok(Codec::new(
        name,
        OptionalCodec {
            desc: desc.clone(),
            inner,
        },
    ))
}

pub(crate) fn build_boxed(
    ctx: &mut BuildContext,
    name: &'static str,
    desc: &BoxedDesc,
) -> Result<Codec> {
    let inner = ctx.codec(&(desc.inner)())?;
    Ok(Codec::new(
        name,
        BoxedCodec {
            desc: desc.clone(),
            inner,
        },
    ))
}

/// `None` is null; `Some` is the inner encoding.
struct OptionalCodec {
    desc: OptionalDesc,
    inner: Codec,
}

impl ValueEncoder for OptionalCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        match (self.desc.get)(value)? {
            Some(inner) => self.inner.encode(inner, writer),
            None => {
                writer.write_nil();
                Ok(())
            }
        }
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok((self.desc.get)(value)?.is_none())
    }
}

impl ValueDecoder for OptionalCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return (self.desc.clear)(target);
        }
        let slot = (self.desc.get_or_insert_default)(target)?;
        self.inner.decode(slot, reader)
    }
}

/// Transparent: the box is never null and never empty.
struct BoxedCodec {
    desc: BoxedDesc,
    inner: Codec,
}

impl ValueEncoder for BoxedCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        self.inner.encode((self.desc.get)(value)?, writer)
    }

    fn is_empty(&self, _value: &dyn Any) -> Result<bool> {
        Ok(false)
    }
}

impl ValueDecoder for BoxedCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        self.inner.decode((self.desc.get_mut)(target)?, reader)
    }
}
