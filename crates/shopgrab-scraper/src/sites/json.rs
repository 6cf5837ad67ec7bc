//! Safe navigation over `serde_json::Value`.
//!
//! Absence at any level yields `None`; nothing here panics on shape.

use serde_json::Value;

/// One step of a path: an object key or an array index.
#[derive(Debug, Clone, Copy)]
pub enum Step<'a> {
    Key(&'a str),
    Index(usize),
}

/// Follows `path` from `value`, e.g. `[Key("discounts"), Index(0)]`.
#[must_use]
pub fn at<'v>(value: &'v Value, path: &[Step<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, step| match step {
        Step::Key(key) => current.as_object()?.get(*key),
        Step::Index(index) => current.as_array()?.get(*index),
    })
}

/// Shorthand for an all-keys path.
#[must_use]
pub fn at_keys<'v>(value: &'v Value, keys: &[&str]) -> Option<&'v Value> {
    keys.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Strings as-is, numbers and booleans rendered; empty strings are `None`.
#[must_use]
pub fn as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers, or strings that parse as numbers.
#[must_use]
pub fn as_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[must_use]
pub fn as_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[must_use]
pub fn as_bool(value: Option<&Value>) -> Option<bool> {
    value?.as_bool()
}

/// Array elements, or an empty slice for anything that is not an array.
#[must_use]
pub fn items(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
