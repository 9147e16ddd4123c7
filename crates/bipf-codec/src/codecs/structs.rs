use std::any::Any;
use std::str;
use std::sync::Arc;

use bipf_wire::{Reader, Result, Writer};
use tracing::trace;

use crate::codec::{Codec, ValueDecoder, ValueEncoder};
use crate::descriptor::StructDescriptor;
use crate::engine::BuildContext;
use crate::reflect::{StructDesc, TypeDesc};

pub(crate) fn build(ctx: &mut BuildContext, desc: &TypeDesc, fields: &StructDesc) -> Result<Codec> {
    let descriptor = Arc::new(StructDescriptor::build(ctx, desc, fields)?);
    ctx.register_descriptor(desc.id, descriptor.clone());
    Ok(Codec::new(desc.name, StructCodec { descriptor }))
}

/// OBJECT of (field name, field value) pairs.
struct StructCodec {
    descriptor: Arc<StructDescriptor>,
}

impl ValueEncoder for StructCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        let bindings = self.descriptor.bindings();
        if bindings.is_empty() {
            writer.write_empty_object();
            return Ok(());
        }

        writer.write_object(|w| {
            for binding in bindings {
                let Some(field) = binding.get(value)? else {
                    continue;
                };
                if binding.omit_empty() && binding.codec().is_empty(field)? {
                    continue;
                }
                w.write_string(binding.name());
                binding
                    .codec()
                    .encode(field, w)
                    .map_err(|err| err.in_field(binding.name()))?;
            }
            Ok(())
        })
    }

    fn is_empty(&self, _value: &dyn Any) -> Result<bool> {
        Ok(false)
    }
}

impl ValueDecoder for StructCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        if reader.check_nil_is_next()? {
            return Ok(());
        }

        reader.read_object_cb(|r| {
            let key = r.read_str_bytes()?;
            let binding = str::from_utf8(key)
                .ok()
                .and_then(|key| self.descriptor.find(key));

            match binding {
                Some(binding) => {
                    let slot = binding.get_mut(&mut *target)?;
                    binding
                        .codec()
                        .decode(slot, r)
                        .map_err(|err| err.in_field(binding.name()))
                }
                None => {
                    trace!(
                        type_name = self.descriptor.type_name(),
                        key = %String::from_utf8_lossy(key),
                        "skipping unknown field"
                    );
                    r.skip()
                }
            }
        })
    }
}
