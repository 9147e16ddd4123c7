use std::any::Any;

use bipf_wire::{BipfError, Reader, Result, Writer};

use crate::codec::{Codec, ValueDecoder, ValueEncoder};
use crate::codecs::dynamic::check_dynamic_key;
use crate::engine::BuildContext;
use crate::reflect::MapDesc;

pub(crate) fn build(ctx: &mut BuildContext, name: &'static str, desc: &MapDesc) -> Result<Codec> {
    let key_desc = (desc.key)();
    let dynamic_key = key_desc.kind.is_dynamic();
    if !dynamic_key && !key_desc.kind.is_key_kind() {
        return Err(BipfError::UnsupportedKeyType(key_desc.name));
    }
    let key = ctx.codec(&key_desc)?;
    let value = ctx.codec(&(desc.value)())?;

    Ok(Codec::new(
        name,
        MapCodec {
            desc: desc.clone(),
            key,
            value,
            dynamic_key,
        },
    ))
}

/// OBJECT of encoded (key, value) pairs in the map's iteration order.
///
/// Null input clears the map. Object input merges into the existing
/// entries; a repeated key keeps the last value.
struct MapCodec {
    desc: MapDesc,
    key: Codec,
    value: Codec,
    /// Keys are checked one by one on encode.
    dynamic_key: bool,
}

impl ValueEncoder for MapCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        if (self.desc.len)(value)? == 0 {
            writer.write_empty_object();
            return Ok(());
        }

        writer.write_object(|w| {
            (self.desc.for_each)(value, &mut |k: &dyn Any, v: &dyn Any| {
                if self.dynamic_key {
                    check_dynamic_key(k)?;
                }
                self.key.encode(k, w)?;
                self.value.encode(v, w)
            })
        })
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        Ok((self.desc.len)(value)? == 0)
    }
}

impl ValueDecoder for MapCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return (self.desc.clear)(target);
        }

        reader.read_object_cb(|r| {
            let mut key = (self.desc.new_key)();
            self.key.decode(&mut *key, r)?;
            let mut value = (self.desc.new_value)();
            self.value.decode(&mut *value, r)?;
            (self.desc.insert)(&mut *target, key, value)
        })
    }
}
