//! Serde helpers for JSON fields that may hold either a string or a number.
//!
//! Numbers are rendered the way a JSON client would print them: `42` and
//! `42.0` become `"42"`, `1.5e3` becomes `"1500"` and `4.5` stays `"4.5"`.
//! Booleans, objects and arrays are always rejected.

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use serde_json::{Number, Value};

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Field that must be a string or a number when present.
///
/// Pair with `#[serde(default)]` so a missing field becomes `None` and can be
/// reported by validation instead of by the JSON parser.
pub fn required_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Err(D::Error::custom("expected a string or a number, found null")),
        other => scalar_to_string(other).map(Some).map_err(D::Error::custom),
    }
}

/// Field that may be a string, a number or `null`
pub fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        other => scalar_to_string(other).map(Some).map_err(D::Error::custom),
    }
}

fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(number_to_string(&n)),
        Value::Bool(_) => Err("expected a string or a number, found a boolean".to_string()),
        Value::Array(_) => Err("expected a string or a number, found an array".to_string()),
        Value::Object(_) => Err("expected a string or a number, found an object".to_string()),
        Value::Null => Err("expected a string or a number, found null".to_string()),
    }
}

fn number_to_string(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        // Drop the `.0` serde_json prints for integral floats
        Some(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_F64_INT => (f as i64).to_string(),
        _ => n.to_string(),
    }
}
