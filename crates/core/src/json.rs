//! Semantic JSON handling shared by both directions of the codec.
//!
//! Declared configuration carries `params` and `search_template` as JSON
//! strings, while the store works with structured values. Comparisons
//! between the two must never be textual: key order, whitespace and the
//! spelling of numbers (`1` vs `1.0`) are irrelevant.

use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};

/// Parse a JSON string that must contain an object.
///
/// An empty string yields an empty object. Anything else that is not a
/// JSON object is reported as [`CoreError::Decode`] against `field`.
pub fn parse_object(field: &'static str, raw: &str) -> CoreResult<Map<String, Value>> {
    if raw.is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(raw).map_err(|source| CoreError::Decode { field, source })
}

/// Compare two JSON values structurally.
///
/// Objects compare by key set regardless of order, arrays element-wise,
/// numbers by numeric value. Two integers compare exactly; floating point
/// is only used when one side is a float.
pub fn semantic_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                matches!((x.as_f64(), y.as_f64()), (Some(x), Some(y)) if x == y)
            } else {
                x == y
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| semantic_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => objects_eq(x, y),
        _ => a == b,
    }
}

/// [`semantic_eq`] for two objects.
pub fn objects_eq(x: &Map<String, Value>, y: &Map<String, Value>) -> bool {
    x.len() == y.len()
        && x
            .iter()
            .all(|(key, value)| y.get(key).is_some_and(|other| semantic_eq(value, other)))
}

/// Diff-suppression check for two JSON-encoded strings.
///
/// Returns `true` when both parse and are semantically equal. If either
/// side fails to parse, only identical strings are considered equal.
pub fn json_str_equivalent(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (
        serde_json::from_str::<Value>(a),
        serde_json::from_str::<Value>(b),
    ) {
        (Ok(a), Ok(b)) => semantic_eq(&a, &b),
        _ => false,
    }
}

/// Render a value as compact JSON with object keys sorted at every level.
///
/// Used whenever a structured value is written back into the declared
/// shape, so repeated reads of the same remote state render identically.
pub fn canonical_string(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// [`canonical_string`] for an object.
pub fn canonical_object_string(map: &Map<String, Value>) -> String {
    canonical_string(&Value::Object(map.clone()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
