use std::collections::BTreeMap;

use commerce_core::error::{AppError, ItemError};
use commerce_core::literal::{balanced_literal, parse_literal};
use commerce_core::models::{RawProduct, SourceKind};
use commerce_core::traits::{ExtractedItems, SourceParser};
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::fields::{price_field, scalar_text, str_field, string_list, type_name};

/// Storefront the demo bundle was built for.
pub const NETLIFY_BASE_URL: &str = "https://effulgent-kataifi-4fc56b.netlify.app";

/// Variable the bundler assigns the catalog array to.
pub const DEFAULT_ANCHOR: &str = "wf";

/// Parser for compiled storefront bundles that embed the catalog as a literal.
///
/// The literal is located by its binding name, e.g. `const wf=[...]` or the
/// minified `,wf=[...]` inside a declaration list, cut out by bracket
/// matching and decoded with the tolerant literal parser.
#[derive(Debug, Clone)]
pub struct BundledScriptParser {
    base_url: String,
    anchor: String,
    currency: String,
}

impl Default for BundledScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BundledScriptParser {
    pub fn new() -> Self {
        Self {
            base_url: NETLIFY_BASE_URL.to_string(),
            anchor: DEFAULT_ANCHOR.to_string(),
            currency: "USD".to_string(),
        }
    }

    /// Storefront base used to build `#product-{id}` links.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, AppError> {
        Url::parse(base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid base URL '{base_url}': {e}")))?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Binding name the catalog literal is assigned to.
    pub fn with_anchor(mut self, anchor: &str) -> Self {
        self.anchor = anchor.trim().to_string();
        self
    }

    fn anchor_pattern(&self) -> Result<Regex, AppError> {
        let pattern = format!(
            r"(?:\b(?:const|let|var)\s+|[,;]\s*){}\s*=\s*",
            regex::escape(&self.anchor)
        );
        Regex::new(&pattern)
            .map_err(|e| AppError::ConfigError(format!("Invalid anchor '{}': {e}", self.anchor)))
    }

    /// Find the first assignment to the anchor whose right-hand side is a
    /// complete array or object literal.
    fn locate<'a>(&self, text: &'a str) -> Result<&'a str, AppError> {
        let pattern = self.anchor_pattern()?;
        let mut last_error = None;
        for found in pattern.find_iter(text) {
            match balanced_literal(text, found.end()) {
                Ok(literal) => return Ok(literal),
                Err(e) => last_error = Some(e),
            }
        }
        Err(AppError::SourceFormatUnrecognized(match last_error {
            Some(e) => format!(
                "Product literal ({}) inside the JS bundle is not self-contained: {e}",
                self.anchor
            ),
            None => format!(
                "Unable to locate product array ({}) inside the JS bundle",
                self.anchor
            ),
        }))
    }

    fn to_product(&self, data: &Value) -> Result<RawProduct, ItemError> {
        if !data.is_object() {
            return Err(ItemError::Malformed(format!(
                "expected object, found {}",
                type_name(data)
            )));
        }

        let id = scalar_text(data.get("id"));
        let url = match &id {
            Some(id) => format!("{}/#product-{id}", self.base_url),
            None => format!("{}/", self.base_url),
        };

        let mut tags = Vec::new();
        if let Some(category) = str_field(data, "category") {
            tags.push(category.to_lowercase());
        }
        tags.extend(string_list(data.get("colors")).iter().map(|c| c.to_lowercase()));

        let availability = match data.get("inStock") {
            Some(Value::Bool(false)) => "out_of_stock",
            _ => "in_stock",
        };

        Ok(RawProduct {
            name: str_field(data, "name"),
            description: str_field(data, "description"),
            price: price_field(data.get("price")),
            currency: Some(self.currency.clone()),
            url: Some(url),
            tags,
            availability: Some(availability.to_string()),
            metadata: bundle_metadata(data, id),
        })
    }
}

impl SourceParser for BundledScriptParser {
    fn kind(&self) -> SourceKind {
        SourceKind::BundledScript
    }

    fn extract(&self, source: &str) -> Result<ExtractedItems, AppError> {
        let literal = self.locate(source)?;
        tracing::debug!("Located {} byte catalog literal", literal.len());

        let parsed = parse_literal(literal).map_err(|e| {
            AppError::SourceFormatUnrecognized(format!("Failed to decode bundle product payload: {e}"))
        })?;

        let entries = match parsed {
            Value::Array(entries) => entries,
            other => {
                return Err(AppError::SourceFormatUnrecognized(format!(
                    "Expected a list of products in the bundle payload, found {}",
                    type_name(&other)
                )));
            }
        };

        Ok(entries.iter().map(|entry| self.to_product(entry)).collect())
    }
}

fn bundle_metadata(data: &Value, id: Option<String>) -> BTreeMap<String, String> {
    let sizes = string_list(data.get("sizes")).join(", ");
    let mappings = [
        ("id", id),
        ("image", scalar_text(data.get("image"))),
        ("rating", scalar_text(data.get("rating"))),
        ("reviews", scalar_text(data.get("reviews"))),
        ("sizes", (!sizes.is_empty()).then_some(sizes)),
    ];

    mappings
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_core::RawPrice;

    #[test]
    fn test_extracts_const_literal() {
        let bundle = r#"import{a as x}from"./vendor.js";const wf=[{id:1,name:"Cashmere Crew",description:'Soft, warm.',price:98,category:"Crew Neck",colors:["Navy","Oat"],sizes:["S","M"],rating:4.8,reviews:0,image:"/img/1.jpg"},{id:2,name:"Wool Cardigan",price:"120.00",inStock:!1},];function render(){return wf.map(p=>p.name)}"#;

        let items = BundledScriptParser::new().extract(bundle).unwrap();
        assert_eq!(items.len(), 2);

        let crew = items[0].as_ref().unwrap();
        assert_eq!(crew.name.as_deref(), Some("Cashmere Crew"));
        assert_eq!(crew.price, Some(RawPrice::Amount(98.0)));
        assert_eq!(
            crew.url.as_deref(),
            Some("https://effulgent-kataifi-4fc56b.netlify.app/#product-1")
        );
        assert_eq!(crew.tags, vec!["crew neck", "navy", "oat"]);
        assert_eq!(crew.availability.as_deref(), Some("in_stock"));
        assert_eq!(crew.metadata["sizes"], "S, M");
        assert_eq!(crew.metadata["reviews"], "0");
        assert_eq!(crew.metadata["id"], "1");

        let cardigan = items[1].as_ref().unwrap();
        assert_eq!(cardigan.price, Some(RawPrice::Text("120.00".into())));
        assert_eq!(cardigan.availability.as_deref(), Some("out_of_stock"));
        assert!(cardigan.description.is_none());
    }

    #[test]
    fn test_minified_declaration_list() {
        let bundle = "var a=1,wf=[{id:'x9',name:'Beanie',price:25}],b=2;";
        let items = BundledScriptParser::new().extract(bundle).unwrap();
        let beanie = items[0].as_ref().unwrap();
        assert_eq!(
            beanie.url.as_deref(),
            Some("https://effulgent-kataifi-4fc56b.netlify.app/#product-x9")
        );
    }

    #[test]
    fn test_custom_anchor_and_base() {
        let bundle = "let catalog = [{id: 7, name: 'Hat', price: 10}];";
        let items = BundledScriptParser::new()
            .with_anchor("catalog")
            .with_base_url("https://shop.example.com/")
            .unwrap()
            .extract(bundle)
            .unwrap();
        assert_eq!(
            items[0].as_ref().unwrap().url.as_deref(),
            Some("https://shop.example.com/#product-7")
        );
    }

    #[test]
    fn test_skips_non_literal_assignment() {
        // Only the third assignment has a literal on its right-hand side.
        let bundle = "let wf = load();\nwf = 0;const x=1;var wf=[{name:'Tote',price:5}];";
        let items = BundledScriptParser::new().extract(bundle).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_non_object_entries_are_isolated() {
        let bundle = "const wf=[{name:'Tote',price:5},'oops',null];";
        let items = BundledScriptParser::new().extract(bundle).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ItemError::Malformed(_))));
        assert!(matches!(items[2], Err(ItemError::Malformed(_))));
    }

    #[test]
    fn test_unrecognized_bundles() {
        let parser = BundledScriptParser::new();

        let err = parser.extract("console.log('no catalog here')").unwrap_err();
        assert!(err.to_string().contains("Unable to locate product array (wf)"));

        let err = parser.extract("const wf=[{name:'x'").unwrap_err();
        assert!(err.to_string().contains("not self-contained"));

        let err = parser.extract("const wf={a:1};").unwrap_err();
        assert!(err.to_string().contains("Expected a list of products"));

        let err = parser.extract("const wf=[{price: fetchPrice()}];").unwrap_err();
        assert!(err.is_source_failure());
    }
}
