//! Conversion of loosely-typed JSON request values into stored field text.
//!
//! Every hash field is a string in the store. Request bodies, however, may carry
//! strings, numbers or booleans, and a value only counts as "supplied" when it
//! is truthy:
//!
//! - strings: non-empty
//! - numbers: non-zero
//! - booleans: `true`
//! - `null`, arrays and objects never count

use serde_json::Value;

/// Render a supplied (truthy) scalar as stored field text.
///
/// Returns `None` for anything that does not count as supplied.
pub fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Render any scalar as stored field text, falsy ones included (`0` → `"0"`).
///
/// Returns `None` for `null`, arrays and objects.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Field text for bulk ingestion, which writes whatever scalar it was handed.
///
/// Only absent, `null` and non-scalar values become the empty string.
pub fn lenient_text(value: Option<&Value>) -> String {
    value.and_then(scalar_text).unwrap_or_default()
}
