//! Dynamic value tree for plugin-supplied custom fields.
//!
//! `DynamicValue` is the closed, tagged form used on the wire. The host side is
//! `serde_json::Value`; [`DynamicValueMapper`] converts between the two by
//! structural recursion, preserving the integral/floating numeric kind.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::foundation::{ChatError, DataError};

/// A recursively tagged value. No cycles are representable.
///
/// Decoding keeps the numeric kind of the wire: `1` becomes `Int`, `1.0`
/// becomes `Double`, and an integer beyond the `i64` range is rejected rather
/// than widened to `Double`. `null` has no tagged form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DynamicValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<DynamicValue>),
    Map(HashMap<String, DynamicValue>),
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        DynamicValue::Int(value)
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        DynamicValue::Double(value)
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        DynamicValue::Bool(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        DynamicValue::String(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        DynamicValue::String(value)
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicValueVisitor)
    }
}

struct DynamicValueVisitor;

impl<'de> Visitor<'de> for DynamicValueVisitor {
    type Value = DynamicValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a bool, an i64 integer, a double, a string, an array or a map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DynamicValue, E> {
        i64::try_from(v)
            .map(DynamicValue::Int)
            .map_err(|_| E::custom(format!("integer {v} exceeds the Int range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DynamicValue, E> {
        Ok(DynamicValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DynamicValue, E> {
        Ok(DynamicValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DynamicValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(DynamicValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DynamicValue, A::Error> {
        let mut entries = HashMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, DynamicValue>()? {
            entries.insert(key, value);
        }
        Ok(DynamicValue::Map(entries))
    }
}

/// Bidirectional conversion between [`DynamicValue`] and host JSON values.
pub struct DynamicValueMapper;

impl DynamicValueMapper {
    /// Converts a tagged value into its host representation.
    ///
    /// A non-finite `Double` has no JSON form and maps to `Value::Null`.
    pub fn to_host_value(value: &DynamicValue) -> serde_json::Value {
        use serde_json::Value;

        match value {
            DynamicValue::Int(v) => Value::from(*v),
            DynamicValue::Double(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            DynamicValue::String(v) => Value::String(v.clone()),
            DynamicValue::Bool(v) => Value::Bool(*v),
            DynamicValue::Array(items) => Value::Array(items.iter().map(Self::to_host_value).collect()),
            DynamicValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::to_host_value(v)))
                    .collect(),
            ),
        }
    }

    /// Converts a host value into its tagged form.
    ///
    /// # Errors
    ///
    /// `InvalidData(UnsupportedValue)` for `null` and for integers outside the
    /// `i64` range, at any depth.
    pub fn to_tagged_value(value: &serde_json::Value) -> Result<DynamicValue, ChatError> {
        use serde_json::Value;

        match value {
            Value::Bool(v) => Ok(DynamicValue::Bool(*v)),
            Value::String(v) => Ok(DynamicValue::String(v.clone())),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(DynamicValue::Int(v))
                } else if n.is_u64() {
                    Err(unsupported(format!("integer {n} exceeds the Int range")))
                } else {
                    n.as_f64()
                        .map(DynamicValue::Double)
                        .ok_or_else(|| unsupported(format!("number {n}")))
                }
            }
            Value::Array(items) => items
                .iter()
                .map(Self::to_tagged_value)
                .collect::<Result<Vec<_>, _>>()
                .map(DynamicValue::Array),
            Value::Object(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), Self::to_tagged_value(v)?)))
                .collect::<Result<HashMap<_, _>, ChatError>>()
                .map(DynamicValue::Map),
            Value::Null => Err(unsupported("null")),
        }
    }
}

fn unsupported(what: impl Into<String>) -> ChatError {
    ChatError::InvalidData(DataError::UnsupportedValue(what.into()))
}
