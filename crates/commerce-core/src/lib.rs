pub mod compress;
pub mod error;
pub mod literal;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod traits;
pub mod util;

#[cfg(test)]
mod testutil;

pub use compress::MarkdownCompressor;
pub use error::{AppError, ItemError};
pub use models::{
    Catalog, ProductRecord, RawPrice, RawProduct, SkipPolicy, SkippedItem, SourceKind,
    compute_hash,
};
pub use pipeline::{CommercePipeline, PipelineOptions, Rendered};
pub use traits::{ExtractedItems, SourceParser};
