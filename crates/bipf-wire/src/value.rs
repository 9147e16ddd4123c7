use bytes::Bytes;

use crate::config::{ReaderConfig, WriterConfig};
use crate::error::Result;
use crate::reader::Reader;
use crate::writer::Writer;

/// Any BIPF value, decoded without a target type.
///
/// Object pairs keep their wire order. Keys may be any value and
/// duplicates are preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Double(f64),
    String(String),
    Buffer(Bytes),
    Array(Vec<Value>),
    Object(Vec<(Value, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up the first pair whose key is the string `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(pairs) => pairs
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Append this value's encoding to `writer`.
    pub fn write_to(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Value::Null => writer.write_nil(),
            Value::Bool(b) => writer.write_bool(*b),
            Value::Int(n) => writer.write_i32(*n),
            Value::Double(n) => writer.write_f64(*n),
            Value::String(s) => writer.write_string(s),
            Value::Buffer(b) => writer.write_buffer(b),
            Value::Array(items) => {
                return writer.write_array(|w| items.iter().try_for_each(|item| item.write_to(w)));
            }
            Value::Object(pairs) => {
                return writer.write_object(|w| {
                    pairs.iter().try_for_each(|(key, value)| {
                        key.write_to(w)?;
                        value.write_to(w)
                    })
                });
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::with_config(&WriterConfig::default());
        self.write_to(&mut writer)?;
        Ok(writer.into_vec())
    }

    /// Decode exactly one value spanning all of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Value> {
        Self::from_bytes_with_config(data, ReaderConfig::default())
    }

    pub fn from_bytes_with_config(data: &[u8], config: ReaderConfig) -> Result<Value> {
        let mut reader = Reader::with_config(data, config);
        reader
            .read_any()
            .and_then(|value| reader.finish().map(|()| value))
            .map_err(|err| reader.annotate(err))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Buffer(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
