use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use commerce_core::models::{Catalog, ProductRecord, SkippedItem};
use commerce_core::pipeline::Rendered;

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ProcessRequest {
    /// `generic-json`, `html-snapshot` or `bundled-script` (`json`, `html`, `js` also accepted).
    #[schema(example = "generic-json")]
    pub kind: String,
    /// Raw source text.
    pub content: String,
    pub title: Option<String>,
    /// Keep at most this many products (at least 1).
    #[schema(minimum = 1)]
    pub max_items: Option<usize>,
    /// `skip` (default) or `abort`.
    pub skip_policy: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct FileProcessRequest {
    /// Path relative to the server's data directory.
    #[schema(example = "catalog.json")]
    pub path: String,
    /// Inferred from the file extension when omitted.
    pub kind: Option<String>,
    pub title: Option<String>,
    #[schema(minimum = 1)]
    pub max_items: Option<usize>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub url: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(r: ProductRecord) -> Self {
        Self {
            name: r.name,
            description: r.description,
            price: r.price,
            currency: r.currency,
            url: r.url,
            tags: r.tags,
            availability: r.availability,
            metadata: r.metadata,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SkippedItemResponse {
    /// Position of the item in the source.
    pub index: usize,
    pub reason: String,
}

impl From<SkippedItem> for SkippedItemResponse {
    fn from(s: SkippedItem) -> Self {
        Self {
            index: s.index,
            reason: s.reason,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProcessedResponse {
    pub markdown: String,
    pub items: Vec<ProductResponse>,
    pub extracted: usize,
    pub skipped: usize,
    pub skipped_items: Vec<SkippedItemResponse>,
    /// SHA-256 of `markdown`.
    pub content_hash: String,
}

impl From<Rendered> for ProcessedResponse {
    fn from(rendered: Rendered) -> Self {
        let Catalog { records, skipped } = rendered.catalog;
        Self {
            markdown: rendered.markdown,
            extracted: records.len(),
            skipped: skipped.len(),
            items: records.into_iter().map(ProductResponse::from).collect(),
            skipped_items: skipped.into_iter().map(SkippedItemResponse::from).collect(),
            content_hash: rendered.content_hash,
        }
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
