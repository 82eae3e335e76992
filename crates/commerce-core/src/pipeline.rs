use std::path::Path;

use crate::compress::MarkdownCompressor;
use crate::error::AppError;
use crate::models::{Catalog, SkipPolicy, SkippedItem, compute_hash};
use crate::schema::validate;
use crate::traits::{ExtractedItems, SourceParser};

/// Knobs shared by every source kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub skip_policy: SkipPolicy,
    /// Keep at most this many validated records.
    pub limit: Option<usize>,
}

/// Markdown plus the catalog it was rendered from.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub markdown: String,
    pub catalog: Catalog,
    /// SHA-256 of `markdown`
    pub content_hash: String,
}

/// Orchestrates the pipeline: extract → validate → limit → render → (persist).
///
/// Generic over the source parser so each payload kind plugs in the same way
/// and tests can inject a mock.
pub struct CommercePipeline<P: SourceParser> {
    parser: P,
    compressor: MarkdownCompressor,
    options: PipelineOptions,
}

impl<P: SourceParser> CommercePipeline<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            compressor: MarkdownCompressor::new(),
            options: PipelineOptions::default(),
        }
    }

    pub fn with_compressor(mut self, compressor: MarkdownCompressor) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Extract and validate the records of one source.
    pub fn parse(&self, source: &str) -> Result<Catalog, AppError> {
        tracing::info!(
            kind = %self.parser.kind(),
            "Parsing {} bytes of source",
            source.len()
        );
        let items = self.parser.extract(source)?;
        let found = items.len();

        let mut catalog = validate_items(items, self.options.skip_policy)?;
        if let Some(limit) = self.options.limit {
            catalog.records.truncate(limit);
        }

        tracing::info!(
            found,
            extracted = catalog.extracted_count(),
            skipped = catalog.skipped_count(),
            "Catalog ready"
        );
        Ok(catalog)
    }

    /// Parse the source and render it under `title`.
    pub fn build_markdown(&self, source: &str, title: Option<&str>) -> Result<Rendered, AppError> {
        let catalog = self.parse(source)?;
        let markdown = self.compressor.build_listing(&catalog.records, title);
        let content_hash = compute_hash(&markdown);
        Ok(Rendered {
            markdown,
            catalog,
            content_hash,
        })
    }

    /// Render and overwrite the artifact at `output`.
    pub fn write_markdown(
        &self,
        source: &str,
        output: &Path,
        title: Option<&str>,
    ) -> Result<Rendered, AppError> {
        let rendered = self.build_markdown(source, title)?;
        persist(&rendered.markdown, output)?;
        tracing::info!(
            hash = %&rendered.content_hash[..8],
            "Wrote {}",
            output.display()
        );
        Ok(rendered)
    }
}

/// Validate every extracted item, applying the skip policy to failures.
///
/// Item indices in the skip report refer to positions in the source.
pub fn validate_items(items: ExtractedItems, policy: SkipPolicy) -> Result<Catalog, AppError> {
    let mut catalog = Catalog::default();

    for (index, item) in items.into_iter().enumerate() {
        match item.and_then(validate) {
            Ok(record) => catalog.records.push(record),
            Err(source) => {
                if policy == SkipPolicy::Abort {
                    return Err(AppError::ItemValidationFailed { index, source });
                }
                tracing::warn!(index, "Skipping item: {source}");
                catalog.skipped.push(SkippedItem {
                    index,
                    reason: source.to_string(),
                });
            }
        }
    }

    Ok(catalog)
}

/// Read a source file, mapping a missing file to [`AppError::NotFound`].
pub fn read_source(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::NotFound(path.display().to_string()),
        _ => AppError::IoError(e),
    })
}

/// Overwrite `path` with `markdown`, creating parent directories as needed.
pub fn persist(markdown: &str, path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, markdown)?;
    Ok(())
}
