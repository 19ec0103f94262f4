//! Input sanitisation helpers shared by every write path and by the listing
//! query builder. All functions are total: bad input degrades to an empty or
//! absent value instead of an error.

use serde_json::{Map, Value};

/// Longest string kept by [`sanitize_string`].
pub const MAX_STRING_LENGTH: usize = 200;

/// Largest number accepted by [`sanitize_number`].
pub const MAX_NUMBER: f64 = 999_999_999.0;

/// Default cap used by [`limit_array_length`] callers.
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 50;

/// Strip `{`, `}` and `$`, trim, and cap at [`MAX_STRING_LENGTH`] characters.
pub fn sanitize_string(input: &str) -> String {
    let stripped: String = input.chars().filter(|c| !matches!(c, '{' | '}' | '$')).collect();
    stripped.trim().chars().take(MAX_STRING_LENGTH).collect()
}

/// Like [`sanitize_string`] for untyped input: anything but a JSON string
/// becomes the empty string.
pub fn sanitize_value_string(input: &Value) -> String {
    match input {
        Value::String(s) => sanitize_string(s),
        _ => String::new(),
    }
}

/// Coerce to a number and keep it only when it is finite and within
/// `0..=MAX_NUMBER`.
///
/// Coercion follows the loose rules of form/query input: numbers pass through,
/// numeric strings are parsed after trimming (a blank string is zero), booleans
/// are 0/1, null is zero. Arrays and objects are never numbers.
pub fn sanitize_number(input: &Value) -> Option<f64> {
    let n = match input {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => coerce_str(s)?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => return None,
    };
    in_range(n)
}

/// [`sanitize_number`] for a raw query-string value.
pub fn sanitize_number_str(input: &str) -> Option<f64> {
    coerce_str(input).and_then(in_range)
}

fn coerce_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok()
}

fn in_range(n: f64) -> Option<f64> {
    if !n.is_finite() || !(0.0..=MAX_NUMBER).contains(&n) {
        return None;
    }
    Some(n)
}

/// True iff `id` is exactly 24 hexadecimal characters.
pub fn is_valid_object_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Recursively sanitise an untyped JSON body.
///
/// Strings go through [`sanitize_string`], numbers through [`sanitize_number`],
/// arrays are mapped element-wise and objects are rebuilt without any key that
/// contains `$` or `.`. A number that fails sanitisation is dropped from its
/// object and becomes `null` inside an array.
pub fn sanitize_object(input: Value) -> Value {
    match input {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(b),
        Value::String(s) => Value::String(sanitize_string(&s)),
        Value::Number(n) => sanitized_number_value(&Value::Number(n)).unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_object).collect()),
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (key, value) in obj {
                if key.contains('$') || key.contains('.') {
                    continue;
                }
                if value.is_number() {
                    if let Some(n) = sanitized_number_value(&value) {
                        out.insert(key, n);
                    }
                    continue;
                }
                out.insert(key, sanitize_object(value));
            }
            Value::Object(out)
        }
    }
}

fn sanitized_number_value(value: &Value) -> Option<Value> {
    // Keep integers as integers so ids/counts round-trip unchanged.
    if let Some(i) = value.as_u64() {
        return in_range(i as f64).map(|_| Value::from(i));
    }
    sanitize_number(value).and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
}

/// Truncate a JSON array to `max` elements; anything else becomes empty.
pub fn limit_array_length(input: &Value, max: usize) -> Vec<Value> {
    match input {
        Value::Array(items) => items.iter().take(max).cloned().collect(),
        _ => Vec::new(),
    }
}

/// True iff the trimmed length of `input` lies within `[min, max]` characters.
pub fn validate_text_input(input: &str, min: usize, max: usize) -> bool {
    let len = input.trim().chars().count();
    len >= min && len <= max
}
