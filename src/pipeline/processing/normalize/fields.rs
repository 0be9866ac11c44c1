//! Field resolution: "first present value among several candidate names".
//!
//! Legacy records spell the same thing several ways (`featureId`,
//! `feature_id`, `id`, ...). Every lookup in the engine goes through
//! [`resolve`] so that a JSON `null` never shadows a later alias.

use serde_json::{Map, Number, Value};

pub type Object = Map<String, Value>;

/// Get `key` from an optional object, treating `null` as absent
pub fn field<'a>(source: Option<&'a Object>, key: &str) -> Option<&'a Value> {
    source.and_then(|map| map.get(key)).filter(|v| !v.is_null())
}

/// `true` when `key` exists in `map` with a non-null value
pub fn has(map: &Object, key: &str) -> bool {
    field(Some(map), key).is_some()
}

/// `true` when any of `keys` is present in `map`
pub fn has_any(map: &Object, keys: &[&str]) -> bool {
    keys.iter().any(|k| has(map, k))
}

/// First non-null value among `candidates`, in order
pub fn resolve<'a, I>(candidates: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = (Option<&'a Object>, &'a str)>,
{
    candidates
        .into_iter()
        .find_map(|(source, key)| field(source, key))
}

/// Like [`resolve`], falling back to `default` and returning an owned value
pub fn resolve_or<'a, I>(candidates: I, default: Value) -> Value
where
    I: IntoIterator<Item = (Option<&'a Object>, &'a str)>,
{
    resolve(candidates).cloned().unwrap_or(default)
}

/// Borrow `key` of `map` as an object, if it is one
pub fn object_at<'a>(map: &'a Object, key: &str) -> Option<&'a Object> {
    map.get(key).and_then(Value::as_object)
}

/// JavaScript-style truthiness, used for legacy boolean flags
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Coerce a value to a JSON number the way a loose numeric field is read.
///
/// Numbers pass through, numeric strings are parsed (integral values stay
/// integers), booleans become 1/0. Anything else is `None`.
pub fn to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::Bool(b) => Some(Number::from(u8::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(Number::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
        }
        _ => None,
    }
}

/// Render a scalar as an identifier string; strings are used verbatim
pub fn to_id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
