use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The payload shapes the core knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Already-structured JSON: an array of product objects.
    GenericJson,
    /// A saved listing page (PLP).
    HtmlSnapshot,
    /// A JS bundle with the catalog embedded as an object literal.
    BundledScript,
}

impl SourceKind {
    /// Infer the kind from a file extension.
    ///
    /// Example: `"data/assets/main.js"` → `BundledScript`
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(SourceKind::GenericJson),
            "html" | "htm" => Some(SourceKind::HtmlSnapshot),
            "js" | "mjs" => Some(SourceKind::BundledScript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::GenericJson => "generic-json",
            SourceKind::HtmlSnapshot => "html-snapshot",
            SourceKind::BundledScript => "bundled-script",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic-json" | "json" => Ok(SourceKind::GenericJson),
            "html-snapshot" | "html" => Ok(SourceKind::HtmlSnapshot),
            "bundled-script" | "bundle" | "js" => Ok(SourceKind::BundledScript),
            other => Err(format!(
                "Unknown source kind '{other}': expected generic-json, html-snapshot or bundled-script"
            )),
        }
    }
}

/// What to do when a single item fails extraction or validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipPolicy {
    /// Drop the item, record it in the skip report and keep going.
    #[default]
    Skip,
    /// Fail the whole parse on the first bad item.
    Abort,
}

impl fmt::Display for SkipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipPolicy::Skip => f.write_str("skip"),
            SkipPolicy::Abort => f.write_str("abort"),
        }
    }
}

impl FromStr for SkipPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(SkipPolicy::Skip),
            "abort" => Ok(SkipPolicy::Abort),
            other => Err(format!("Unknown skip policy '{other}': expected skip or abort")),
        }
    }
}

/// A price as found in the source: either a number or display text like `"$1,299.50"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Amount(f64),
    Text(String),
}

/// Candidate product fields produced by a source parser, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<RawPrice>,
    pub currency: Option<String>,
    #[serde(alias = "link")]
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub availability: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

/// A validated, normalized product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub url: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// An item that was dropped, with its position in the source and the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub index: usize,
    pub reason: String,
}

/// The result of parsing one source: surviving records plus the skip report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub records: Vec<ProductRecord>,
    pub skipped: Vec<SkippedItem>,
}

impl Catalog {
    pub fn extracted_count(&self) -> usize {
        self.records.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
