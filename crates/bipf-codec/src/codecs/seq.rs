use std::any::Any;

use bipf_wire::{BipfError, Reader, Result, Writer};

use crate::codec::{Codec, ValueDecoder, ValueEncoder};
use crate::engine::BuildContext;
use crate::reflect::{SeqDesc, SeqShape};

pub(crate) fn build(ctx: &mut BuildContext, name: &'static str, desc: &SeqDesc) -> Result<Codec> {
    let elem = ctx.codec(&(desc.elem)())?;
    Ok(Codec::new(
        name,
        SeqCodec {
            desc: desc.clone(),
            elem,
        },
    ))
}

/// ARRAY of elements in index order.
///
/// Growable sequences are cleared before decoding and grow one element per
/// array item. Fixed sequences fill slots from the front; surplus input
/// elements fail with `TooShort` and unfilled slots keep their values.
struct SeqCodec {
    desc: SeqDesc,
    elem: Codec,
}

impl ValueEncoder for SeqCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        let len = (self.desc.len)(value)?;
        if len == 0 {
            writer.write_empty_array();
            return Ok(());
        }

        writer.write_array(|w| {
            for index in 0..len {
                let elem = (self.desc.get)(value, index)?;
                self.elem.encode(elem, w)?;
            }
            Ok(())
        })
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok((self.desc.len)(value)? == 0)
    }
}

impl ValueDecoder for SeqCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        match &self.desc.shape {
            SeqShape::Growable {
                clear,
                push_default,
            } => {
                if reader.check_nil_is_next()? {
                    return clear(target);
                }
                clear(&mut *target)?;
                reader.read_array_cb(|r| {
                    let slot = push_default(&mut *target)?;
                    self.elem.decode(slot, r)
                })
            }
            SeqShape::Fixed(capacity) => {
                if reader.check_nil_is_next()? {
                    return Ok(());
                }
                let capacity = *capacity;
                let mut index = 0;
                reader.read_array_cb(|r| {
                    if index >= capacity {
                        return Err(BipfError::TooShort { capacity });
                    }
                    let slot = (self.desc.get_mut)(&mut *target, index)?;
                    self.elem.decode(slot, r)?;
                    index += 1;
                    Ok(())
                })
            }
        }
    }
}
