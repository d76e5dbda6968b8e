//! Generic recursive transform over JSON document trees.
//!
//! [`transform`] visits every leaf (non-container) value of a
//! [`serde_json::Value`], applies a caller-supplied function, and rebuilds
//! objects and arrays around the transformed children. The result is a full
//! structural clone: no container in the output aliases the input, and the
//! input is never mutated.

use serde_json::{Map, Value};

/// Rebuild `value` bottom-up, applying `f` to every leaf.
///
/// Objects keep their key set (and, with `serde_json`'s `preserve_order`
/// feature, their insertion order); arrays keep their length and element
/// order. Empty containers come back empty without `f` ever being invoked.
/// Recursion depth is bounded only by the document's nesting.
///
/// The walker defines no errors of its own — any `Err` returned by `f`
/// propagates to the caller uninterpreted.
pub fn transform<F, E>(value: &Value, f: &mut F) -> Result<Value, E>
where
    F: FnMut(&Value) -> Result<Value, E>,
{
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                out.insert(key.clone(), transform(child, f)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(transform(item, f)?);
            }
            Ok(Value::Array(out))
        }
        leaf => f(leaf),
    }
}
