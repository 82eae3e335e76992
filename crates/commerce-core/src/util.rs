use std::collections::HashSet;
use std::path::Path;

use url::Url;

/// Trim and collapse every run of whitespace (including newlines) to one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a possibly relative link against a site base.
///
/// Absolute http(s) links are returned unchanged. Returns `None` when the
/// href is blank or cannot be joined.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    base.join(href).ok().map(String::from)
}

/// Remove repeated entries, keeping the first occurrence of each.
pub fn dedupe_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Derive a listing title from a source file path.
///
/// Extracts the file stem and turns separators into spaces.
/// Example: `"data/jcrew_mens_sweaters.html"` → `"jcrew mens sweaters"`
pub fn derive_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("catalog");
    collapse_whitespace(&stem.replace(['_', '-'], " "))
}
