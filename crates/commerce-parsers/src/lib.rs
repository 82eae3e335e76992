pub mod bundle;
pub mod cleaner;
pub mod dispatch;
mod fields;
pub mod html;
pub mod json;

pub use bundle::BundledScriptParser;
pub use cleaner::HtmdCleaner;
pub use dispatch::CatalogParser;
pub use html::{CardSelectors, HtmlSnapshotParser};
pub use json::GenericJsonParser;
