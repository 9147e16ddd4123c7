//! BIPF binary encoding with a type-directed codec engine.
//!
//! # Crate Structure
//!
//! - [`wire`]: tag codec, buffered writer, bounds-checked reader and dynamic values
//! - [`codec`]: reflection descriptors, cached per-type codecs, capabilities
//!
//! The derive macro names its support crate as `::bipf_codec`. When depending
//! on this facade alone, point it here instead:
//!
//! ```
//! use bipf::Reflect;
//!
//! #[derive(Reflect, Default)]
//! #[bipf(crate = "bipf::codec")]
//! struct Feed {
//!     author: String,
//!     sequence: u32,
//! }
//!
//! let bytes = bipf::to_bytes(&Feed { author: "@a".into(), sequence: 7 }).unwrap();
//! let value = bipf::Value::from_bytes(&bytes).unwrap();
//! assert_eq!(value.get("sequence"), Some(&bipf::Value::Int(7)));
//! ```

/// Re-export wire types.
pub mod wire {
    pub use bipf_wire::*;
}

/// Re-export engine types.
pub mod codec {
    pub use bipf_codec::*;
}

pub use bipf_codec::{
    decode_from, encode_into, from_bytes, from_bytes_with_config, to_bytes, to_bytes_with_config,
    AnyValue, BipfError, ByteBuf, Interface, Reader, ReaderConfig, Reflect, Result, Value, Writer,
    WriterConfig,
};
