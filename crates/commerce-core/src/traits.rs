use crate::error::{AppError, ItemError};
use crate::models::{RawProduct, SourceKind};

/// One entry per item found in the source, each independently fallible.
pub type ExtractedItems = Vec<Result<RawProduct, ItemError>>;

/// Extracts raw product field mappings from a payload of a known shape.
///
/// Implementations own their landmark search: the compressor and the schema
/// never see markup. Returning `Err` means the payload as a whole was not
/// recognized; a bad item is reported in place and must not stop the rest.
pub trait SourceParser: Send + Sync + Clone {
    fn kind(&self) -> SourceKind;

    fn extract(&self, source: &str) -> Result<ExtractedItems, AppError>;
}
