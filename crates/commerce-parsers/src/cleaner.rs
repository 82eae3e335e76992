use std::fmt;
use std::sync::Arc;

use commerce_core::util::collapse_whitespace;
use htmd::HtmlToMarkdown;

/// HTML fragment cleaner using htmd.
///
/// Product copy scraped from listing pages often carries inline markup
/// (`<b>`, `<br>`, promo spans). This converts it to one line of Markdown
/// text, dropping non-content elements entirely.
pub struct HtmdCleaner {
    converter: Arc<HtmlToMarkdown>,
}

impl Clone for HtmdCleaner {
    fn clone(&self) -> Self {
        Self {
            converter: Arc::clone(&self.converter),
        }
    }
}

impl fmt::Debug for HtmdCleaner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmdCleaner").finish_non_exhaustive()
    }
}

impl HtmdCleaner {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(vec![
                "script", "style", "noscript", "iframe", "svg", "img", "button", "form",
            ])
            .build();

        Self {
            converter: Arc::new(converter),
        }
    }

    /// Clean a fragment to single-line text. Plain text passes through with
    /// only whitespace collapsed; markup the converter rejects is kept as text.
    pub fn clean(&self, fragment: &str) -> String {
        if !fragment.contains('<') {
            return collapse_whitespace(fragment);
        }
        match self.converter.convert(fragment) {
            Ok(markdown) => collapse_whitespace(&markdown),
            Err(e) => {
                tracing::debug!("htmd could not convert fragment: {e}");
                collapse_whitespace(fragment)
            }
        }
    }
}

impl Default for HtmdCleaner {
    fn default() -> Self {
        Self::new()
    }
}
