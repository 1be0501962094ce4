//! Import of JSON documents into object graphs.

use crate::descriptor::TypeDescriptor;
use crate::error::CoreResult;
use crate::value::{Dictionary, Object, Value};
use serde::{Deserialize, Serialize};

/// How JSON objects are represented in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonObjectMode {
    /// Anonymous structured objects; keys become members
    #[default]
    Structured,
    /// Dictionaries keyed by string
    Dictionary,
}

/// Convert a JSON value into a graph value
#[must_use]
pub fn from_json(value: &serde_json::Value, mode: JsonObjectMode) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => {
            Value::seq(items.iter().map(|item| from_json(item, mode)))
        }
        serde_json::Value::Object(map) => match mode {
            // an empty object has no members to select
            JsonObjectMode::Structured if map.is_empty() => Value::Map(Dictionary::new(
                std::iter::empty::<(String, Value)>(),
            )),
            JsonObjectMode::Structured => {
                let descriptor = TypeDescriptor::anonymous(map.keys().cloned());
                Value::Object(Object::with_members(
                    descriptor,
                    map.iter().map(|(k, v)| (k.clone(), from_json(v, mode))),
                ))
            }
            JsonObjectMode::Dictionary => Value::Map(Dictionary::new(
                map.iter().map(|(k, v)| (k.clone(), from_json(v, mode))),
            )),
        },
    }
}

/// Parse JSON text into a graph value
///
/// # Errors
///
/// Returns error if the input is not valid JSON
pub fn parse_json(input: &str, mode: JsonObjectMode) -> CoreResult<Value> {
    let json: serde_json::Value = serde_json::from_str(input)?;
    Ok(from_json(&json, mode))
}
