//! Test utilities: a mock source parser and record builders.
//!
//! The mock uses `Arc<Mutex<_>>` so it stays `Clone` while handing out a
//! configurable response.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{ProductRecord, RawPrice, RawProduct, SourceKind};
use crate::traits::{ExtractedItems, SourceParser};

// ---------------------------------------------------------------------------
// MockParser
// ---------------------------------------------------------------------------

/// Mock parser that returns a fixed item list or a fatal error.
#[derive(Clone)]
pub struct MockParser {
    response: Arc<Mutex<Option<Result<ExtractedItems, AppError>>>>,
}

impl MockParser {
    pub fn new(items: ExtractedItems) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Ok(items)))),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Err(error)))),
        }
    }
}

impl SourceParser for MockParser {
    fn kind(&self) -> SourceKind {
        SourceKind::GenericJson
    }

    fn extract(&self, _source: &str) -> Result<ExtractedItems, AppError> {
        self.response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn slug(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

/// A raw candidate that passes validation as-is (unless the price is negative).
pub fn raw_product(name: &str, price: f64) -> RawProduct {
    RawProduct {
        name: Some(name.to_string()),
        price: Some(RawPrice::Amount(price)),
        url: Some(format!("https://shop.example.com/p/{}", slug(name))),
        ..Default::default()
    }
}

/// A validated record with only the required fields filled in.
pub fn sample_record(name: &str, price: f64) -> ProductRecord {
    ProductRecord {
        name: name.to_string(),
        description: None,
        price,
        currency: "USD".to_string(),
        url: format!("https://shop.example.com/p/{}", slug(name)),
        tags: Vec::new(),
        availability: None,
        metadata: BTreeMap::new(),
    }
}

// ---------------------------------------------------------------------------
// Markdown reader
// ---------------------------------------------------------------------------

/// Read the `(name, url)` pair back out of every numbered listing entry.
pub fn parse_listing_links(markdown: &str) -> Vec<(String, String)> {
    markdown.lines().filter_map(parse_entry_link).collect()
}

fn parse_entry_link(line: &str) -> Option<(String, String)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". [")?;

    let mut name = String::new();
    let mut chars = rest.char_indices();
    let mut close = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => name.push(chars.next()?.1),
            ']' => {
                close = Some(i);
                break;
            }
            _ => name.push(c),
        }
    }
    let after = rest[close? + 1..].strip_prefix('(')?;

    let url = match after.strip_prefix('<') {
        Some(wrapped) => &wrapped[..wrapped.find(">)")?],
        None => &after[..after.find(')')?],
    };
    Some((name, url.to_string()))
}
