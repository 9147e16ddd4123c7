use std::any::Any;

use bipf_wire::{Reader, Result, Writer};

use crate::codec::{Codec, ValueDecoder, ValueEncoder};
use crate::reflect::CustomDesc;

pub(crate) fn build(name: &'static str, desc: &CustomDesc) -> Codec {
    Codec::new(name, CustomCodec { desc: desc.clone() })
}

/// Delegates to the type's own capability functions.
struct CustomCodec {
    desc: CustomDesc,
}

impl ValueEncoder for CustomCodec {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        (self.desc.encode)(value, writer)
    }

    fn is_empty(&self, _value: &dyn Any) -> Result<bool> {
        Ok(false)
    }
}

impl ValueDecoder for CustomCodec {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        (self.desc.decode)(target, reader)
    }
}
