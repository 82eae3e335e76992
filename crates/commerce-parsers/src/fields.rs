//! Small readers over loosely-typed JSON values shared by the parsers.

use commerce_core::RawPrice;
use commerce_core::util::collapse_whitespace;
use serde_json::Value;

/// Non-blank string field, whitespace-collapsed.
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

/// Strings, numbers and booleans rendered as text; anything else is `None`.
pub(crate) fn scalar_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => collapse_whitespace(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// A price given either as a number or as display text.
pub(crate) fn price_field(value: Option<&Value>) -> Option<RawPrice> {
    match value? {
        Value::Number(n) => n.as_f64().map(RawPrice::Amount),
        Value::String(s) if !s.trim().is_empty() => Some(RawPrice::Text(s.trim().to_string())),
        _ => None,
    }
}

/// The non-blank strings of an array field.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(collapse_whitespace)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
