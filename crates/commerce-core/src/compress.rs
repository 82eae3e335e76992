//! Render validated products into context-optimized Markdown.

use crate::models::ProductRecord;

/// Heading used when no title (or a blank one) is supplied.
pub const DEFAULT_TITLE: &str = "commerce.txt spotlight";

const EMPTY_NOTICE: &str = "_No products available to summarize._";

/// Summarizes product rows into a Markdown block optimized for AI agents.
///
/// Output is a pure function of the records and title: no timestamps, no
/// locale, and prices always render with two decimals and `,` grouping.
#[derive(Debug, Clone)]
pub struct MarkdownCompressor {
    max_description_chars: usize,
    heading_level: usize,
}

impl Default for MarkdownCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownCompressor {
    pub fn new() -> Self {
        Self {
            max_description_chars: 280,
            heading_level: 1,
        }
    }

    /// Descriptions longer than this many characters are cut and end in `...`.
    pub fn with_max_description_chars(mut self, max: usize) -> Self {
        self.max_description_chars = max.max(4);
        self
    }

    /// Heading depth for the title line, clamped to 1..=6.
    pub fn with_heading_level(mut self, level: usize) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    pub fn build_listing(&self, products: &[ProductRecord], title: Option<&str>) -> String {
        let heading = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);

        let mut lines: Vec<String> = Vec::with_capacity(products.len() * 5 + 2);
        lines.push(format!("{} {}", "#".repeat(self.heading_level), heading));
        lines.push(String::new());

        if products.is_empty() {
            lines.push(EMPTY_NOTICE.to_string());
        }

        for (idx, product) in products.iter().enumerate() {
            let price = format!("{} {}", product.currency, format_price(product.price));
            let availability = product
                .availability
                .as_deref()
                .map(|a| format!(" · {a}"))
                .unwrap_or_default();

            lines.push(format!(
                "{}. {} — {price}{availability}",
                idx + 1,
                markdown_link(&product.name, &product.url)
            ));
            if let Some(desc) = product.description.as_deref() {
                lines.push(format!("   - {}", self.trim(desc)));
            }
            if !product.tags.is_empty() {
                lines.push(format!("   - tags: {}", product.tags.join(", ")));
            }
            if !product.metadata.is_empty() {
                let hint = product
                    .metadata
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!("   - meta: {hint}"));
            }
            lines.push(String::new());
        }

        let body = lines
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n", body.trim_end())
    }

    fn trim(&self, text: &str) -> String {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.chars().count() <= self.max_description_chars {
            return text;
        }
        let cut: String = text.chars().take(self.max_description_chars - 3).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Format an amount with two decimals and `,` thousands separators.
pub fn format_price(amount: f64) -> String {
    let fixed = format!("{amount:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}.{frac_part}")
}

/// Build `[text](url)` so both parts survive a Markdown round-trip.
///
/// `\`, `[` and `]` in the text are backslash-escaped; URLs containing
/// parentheses, spaces or angle brackets are wrapped in `<...>`.
pub fn markdown_link(text: &str, url: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    if url.contains(['(', ')', ' ', '<', '>']) {
        let url = url.replace('<', "%3C").replace('>', "%3E");
        format!("[{escaped}](<{url}>)")
    } else {
        format!("[{escaped}]({url})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{parse_listing_links, sample_record};

    #[test]
    fn test_renders_heading_and_entries() {
        let mut first = sample_record("Cashmere crewneck sweater", 1299.5);
        first.description = Some("Our softest   cashmere.\nNow in navy.".into());
        first.tags = vec!["sweaters".into(), "navy".into()];
        first.availability = Some("in_stock".into());
        first.metadata.insert("rating".into(), "4.5".into());
        first.metadata.insert("product_code".into(), "BX123".into());
        let second = sample_record("Wool scarf", 45.0);

        let md = MarkdownCompressor::new().build_listing(&[first, second], Some(" Men sweaters "));

        let expected = "# Men sweaters\n\
            \n\
            1. [Cashmere crewneck sweater](https://shop.example.com/p/cashmere-crewneck-sweater) — USD 1,299.50 · in_stock\n   \
            - Our softest cashmere. Now in navy.\n   \
            - tags: sweaters, navy\n   \
            - meta: product_code: BX123, rating: 4.5\n\
            \n\
            2. [Wool scarf](https://shop.example.com/p/wool-scarf) — USD 45.00\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_empty_listing_has_heading_and_no_entries() {
        let md = MarkdownCompressor::new().build_listing(&[], Some("X"));
        assert!(md.starts_with("# X\n"));
        assert!(md.contains("_No products available to summarize._"));
        assert!(!md.lines().any(|l| l.starts_with("1.")));
    }

    #[test]
    fn test_missing_title_uses_default() {
        let md = MarkdownCompressor::new().build_listing(&[], None);
        assert!(md.starts_with("# commerce.txt spotlight"));
        let md = MarkdownCompressor::new().build_listing(&[], Some("   "));
        assert!(md.starts_with("# commerce.txt spotlight"));
    }

    #[test]
    fn test_heading_level() {
        let md = MarkdownCompressor::new()
            .with_heading_level(2)
            .build_listing(&[], Some("Fixture test"));
        assert!(md.starts_with("## Fixture test"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let records = vec![
            sample_record("B item", 10.0),
            sample_record("A item", 9.99),
        ];
        let compressor = MarkdownCompressor::new();
        let first = compressor.build_listing(&records, Some("Same"));
        let second = compressor.build_listing(&records, Some("Same"));
        assert_eq!(first, second);
        // Source order is kept, no re-sorting.
        assert!(first.find("B item").unwrap() < first.find("A item").unwrap());
    }

    #[test]
    fn test_link_round_trip() {
        let mut tricky = sample_record("Shirt [slim] \\ fit", 30.0);
        tricky.url = "https://shop.example.com/p/shirt_(slim)?q=a b".into();
        let records = vec![sample_record("Plain tee", 20.0), tricky];

        let md = MarkdownCompressor::new().build_listing(&records, Some("Round trip"));
        let links = parse_listing_links(&md);

        assert_eq!(links.len(), records.len());
        for (record, (name, url)) in records.iter().zip(links) {
            assert_eq!(name, record.name);
            assert_eq!(url, record.url);
        }
    }

    #[test]
    fn test_long_description_is_truncated() {
        let mut record = sample_record("Scarf", 10.0);
        record.description = Some("word ".repeat(100));
        let md = MarkdownCompressor::new()
            .with_max_description_chars(20)
            .build_listing(&[record], None);
        assert!(md.contains("   - word word word wo...\n"));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(5.5), "5.50");
        assert_eq!(format_price(999.999), "1,000.00");
        assert_eq!(format_price(1234567.891), "1,234,567.89");
        assert_eq!(format_price(100.0), "100.00");
    }
}
