use commerce_core::error::{AppError, ItemError};
use commerce_core::models::{RawProduct, SourceKind};
use commerce_core::traits::{ExtractedItems, SourceParser};
use serde_json::Value;

use crate::fields::type_name;

/// Keys under which a wrapped product array is accepted.
const WRAPPER_KEYS: [&str; 2] = ["products", "items"];

/// Reads already-structured JSON: a list of product objects.
///
/// The list may also be wrapped as `{"products": [...]}` or `{"items": [...]}`.
/// Each element is deserialized on its own, so one element with wrong field
/// types only costs that element.
#[derive(Debug, Clone, Default)]
pub struct GenericJsonParser;

impl GenericJsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for GenericJsonParser {
    fn kind(&self) -> SourceKind {
        SourceKind::GenericJson
    }

    fn extract(&self, source: &str) -> Result<ExtractedItems, AppError> {
        let value: Value = serde_json::from_str(source).map_err(|e| {
            AppError::SourceFormatUnrecognized(format!("source does not contain valid JSON: {e}"))
        })?;

        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => WRAPPER_KEYS
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| {
                    AppError::SourceFormatUnrecognized(
                        "JSON object has no `products` or `items` array".into(),
                    )
                })?,
            other => {
                return Err(AppError::SourceFormatUnrecognized(format!(
                    "JSON data must be a list of product objects, found {}",
                    type_name(&other)
                )));
            }
        };

        tracing::debug!("Found {} JSON items", items.len());
        Ok(items.into_iter().map(item_from_value).collect())
    }
}

fn item_from_value(value: Value) -> Result<RawProduct, ItemError> {
    if !value.is_object() {
        return Err(ItemError::Malformed(format!(
            "expected object, found {}",
            type_name(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| ItemError::Malformed(e.to_string()))
}
