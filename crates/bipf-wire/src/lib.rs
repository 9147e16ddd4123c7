//! BIPF wire layer: tag codec, buffered writer, and bounds-checked reader.
//!
//! Every BIPF value starts with one varint tag:
//! - the low 3 bits carry the discriminant (STRING, BUFFER, INT, DOUBLE,
//!   ARRAY, OBJECT, BOOLNULL, EXTENDED)
//! - the remaining bits carry the payload length in bytes
//!
//! Composite lengths count encoded child bytes, never elements, so the
//! [`Writer`] buffers children before emitting the composite tag.

pub mod config;
pub mod error;
pub mod reader;
pub mod stack;
pub mod tag;
pub mod value;
pub mod writer;

pub use config::{ReaderConfig, WriterConfig, DEFAULT_MAX_DEPTH};
pub use error::{BipfError, BoxError, Result};
pub use reader::Reader;
pub use stack::ensure_sufficient_stack;
pub use tag::{Discriminant, Tag, NULL_BYTE};
pub use value::Value;
pub use writer::Writer;
