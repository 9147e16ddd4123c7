use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use bipf_wire::{BipfError, Reader, Result, Writer};

/// Encoding half of a codec.
pub trait ValueEncoder: Send + Sync {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()>;

    /// Whether an `omit_empty` field holding `value` is skipped.
    fn is_empty(&self, value: &dyn Any) -> Result<bool>;
}

/// Decoding half of a codec.
pub trait ValueDecoder: Send + Sync {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()>;
}

/// Encoder and decoder bound to one concrete type.
///
/// Codecs hold no per-call state and are shared freely across threads.
#[derive(Clone)]
pub struct Codec {
    type_name: &'static str,
    encoder: Arc<dyn ValueEncoder>,
    decoder: Arc<dyn ValueDecoder>,
}

impl Codec {
    pub fn new<C>(type_name: &'static str, codec: C) -> Self
    where
        C: ValueEncoder + ValueDecoder + 'static,
    {
        Self::from_arc(type_name, Arc::new(codec))
    }

    pub fn from_arc<C>(type_name: &'static str, codec: Arc<C>) -> Self
    where
        C: ValueEncoder + ValueDecoder + 'static,
    {
        Self {
            type_name,
            encoder: codec.clone(),
            decoder: codec,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        self.encoder.encode(value, writer)
    }

    pub fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        self.encoder.is_empty(value)
    }

    pub fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        self.decoder.decode(target, reader)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Codec").field(&self.type_name).finish()
    }
}

/// Stand-in registered for a type while its codec is being built.
///
/// Components of a recursive type capture the placeholder; it is filled
/// once the outer build completes.
pub(crate) struct Placeholder {
    type_name: &'static str,
    target: OnceLock<Codec>,
}

impl Placeholder {
    pub(crate) fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            target: OnceLock::new(),
        }
    }

    pub(crate) fn fill(&self, codec: Codec) {
        // A placeholder belongs to one build context and is filled once.
        let _ = self.target.set(codec);
    }

    fn resolved(&self) -> Result<&Codec> {
        self.target
            .get()
            .ok_or(BipfError::Incomplete(self.type_name))
    }
}

impl ValueEncoder for Placeholder {
    fn encode(&self, value: &dyn Any, writer: &mut Writer) -> Result<()> {
        self.resolved()?.encode(value, writer)
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool> {
        self.resolved()?.is_empty(value)
    }
}

impl ValueDecoder for Placeholder {
    fn decode(&self, target: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
        self.resolved()?.decode(target, reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nil;

    impl ValueEncoder for Nil {
        fn encode(&self, _: &dyn Any, writer: &mut Writer) -> Result<()> {
            writer.write_nil();
            Ok(())
        }

        fn is_empty(&self, _: &dyn Any) -> Result<bool> {
            Ok(true)
        }
    }

    impl ValueDecoder for Nil {
        fn decode(&self, _: &mut dyn Any, reader: &mut Reader<'_>) -> Result<()> {
            reader.read_nil()
        }
    }

    #[test]
    fn unfilled_placeholder_is_incomplete() {
        let placeholder = Arc::new(Placeholder::new("Node"));
        let codec = Codec::from_arc("Node", placeholder.clone());
        let mut writer = Writer::new();
        let err = codec.encode(&(), &mut writer).unwrap_err();
        assert!(matches!(err, BipfError::Incomplete("Node")));

        placeholder.fill(Codec::new("Nil", Nil));
        codec.encode(&(), &mut writer).unwrap();
        assert_eq!(writer.as_slice(), &[0x06]);
        assert!(codec.is_empty(&()).unwrap());
    }
}
