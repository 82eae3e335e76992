use commerce_core::error::AppError;
use commerce_core::models::SourceKind;
use commerce_core::traits::{ExtractedItems, SourceParser};

use crate::bundle::BundledScriptParser;
use crate::html::HtmlSnapshotParser;
use crate::json::GenericJsonParser;

/// Any of the built-in parsers, chosen by source-type tag.
#[derive(Debug, Clone)]
pub enum CatalogParser {
    Json(GenericJsonParser),
    Html(HtmlSnapshotParser),
    Bundle(BundledScriptParser),
}

impl CatalogParser {
    /// The parser with default landmarks for `kind`.
    pub fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::GenericJson => CatalogParser::Json(GenericJsonParser::new()),
            SourceKind::HtmlSnapshot => CatalogParser::Html(HtmlSnapshotParser::new()),
            SourceKind::BundledScript => CatalogParser::Bundle(BundledScriptParser::new()),
        }
    }
}

impl From<GenericJsonParser> for CatalogParser {
    fn from(parser: GenericJsonParser) -> Self {
        CatalogParser::Json(parser)
    }
}

impl From<HtmlSnapshotParser> for CatalogParser {
    fn from(parser: HtmlSnapshotParser) -> Self {
        CatalogParser::Html(parser)
    }
}

impl From<BundledScriptParser> for CatalogParser {
    fn from(parser: BundledScriptParser) -> Self {
        CatalogParser::Bundle(parser)
    }
}

impl SourceParser for CatalogParser {
    fn kind(&self) -> SourceKind {
        match self {
            CatalogParser::Json(p) => p.kind(),
            CatalogParser::Html(p) => p.kind(),
            CatalogParser::Bundle(p) => p.kind(),
        }
    }

    fn extract(&self, source: &str) -> Result<ExtractedItems, AppError> {
        match self {
            CatalogParser::Json(p) => p.extract(source),
            CatalogParser::Html(p) => p.extract(source),
            CatalogParser::Bundle(p) => p.extract(source),
        }
    }
}
