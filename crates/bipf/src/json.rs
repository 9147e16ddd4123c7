//! Conversion between JSON documents and dynamic BIPF values.
//!
//! JSON has no byte-string type, so buffers travel as `{"$buffer": "<hex>"}`.
//! Integers inside the i32 range become INT; every other number is DOUBLE.

use bipf::Value;
use serde_json::{Map, Number, Value as Json};

pub const BUFFER_KEY: &str = "$buffer";

pub fn to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => number_to_value(n),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(to_value).collect()),
        Json::Object(map) => {
            if let Some(buffer) = decode_buffer(map) {
                return buffer;
            }
            Value::Object(
                map.iter()
                    .map(|(k, v)| (Value::String(k.clone()), to_value(v)))
                    .collect(),
            )
        }
    }
}

fn number_to_value(n: &Number) -> Value {
    match n.as_i64().map(i32::try_from) {
        Some(Ok(int)) => Value::Int(int),
        _ => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
    }
}

pub fn from_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        // Non-finite doubles have no JSON form.
        Value::Double(n) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::Buffer(bytes) => {
            let mut map = Map::new();
            map.insert(BUFFER_KEY.to_string(), Json::String(hex::encode(bytes)));
            Json::Object(map)
        }
        Value::Array(items) => Json::Array(items.iter().map(from_value).collect()),
        Value::Object(pairs) => {
            let mut map = Map::new();
            for (key, value) in pairs {
                map.insert(key_text(key), from_value(value));
            }
            Json::Object(map)
        }
    }
}

/// JSON object keys are strings; other key values use their JSON text.
fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => from_value(other).to_string(),
    }
}

/// A `{"$buffer": "<hex>"}` object with valid hex, as a BUFFER.
fn decode_buffer(map: &Map<String, Json>) -> Option<Value> {
    if map.len() != 1 {
        return None;
    }
    let text = map.get(BUFFER_KEY)?.as_str()?;
    let bytes = hex::decode(text).ok()?;
    Some(Value::Buffer(bytes.into()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_pick_int_or_double() {
        assert_eq!(to_value(&json!(7)), Value::Int(7));
        assert_eq!(to_value(&json!(1.5)), Value::Double(1.5));
        assert_eq!(to_value(&json!(4_000_000_000u64)), Value::Double(4e9));
    }

    #[test]
    fn buffers_use_marker_object() {
        let value = to_value(&json!({"$buffer": "dead"}));
        assert_eq!(value, Value::Buffer(vec![0xde, 0xad].into()));
        assert_eq!(from_value(&value), json!({"$buffer": "dead"}));

        // Not hex: an ordinary object.
        let value = to_value(&json!({"$buffer": "zz"}));
        assert!(matches!(value, Value::Object(_)));
    }

    #[test]
    fn non_string_keys_render_as_json_text() {
        let value = Value::Object(vec![(Value::Int(3), Value::Bool(true))]);
        assert_eq!(from_value(&value), json!({"3": true}));
    }
}
