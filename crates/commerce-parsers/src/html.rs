use commerce_core::error::{AppError, ItemError};
use commerce_core::models::{RawPrice, RawProduct, SourceKind};
use commerce_core::traits::{ExtractedItems, SourceParser};
use commerce_core::util::{collapse_whitespace, dedupe_preserving_order, resolve_url};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::cleaner::HtmdCleaner;
use crate::fields::{price_field, scalar_text, str_field, type_name};

/// Site the J.Crew listing snapshots come from.
pub const JCREW_BASE_URL: &str = "https://www.jcrew.com";

const NEXT_DATA_SELECTOR: &str = "script#__NEXT_DATA__";

/// Category path segments that say nothing about the product.
const CATEGORY_STOP_WORDS: [&str; 4] = ["mens", "women", "categories", "clothing"];

/// CSS selectors that find product cards and their parts.
///
/// Each selector may list alternatives; the first match inside a card wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelectors {
    pub card: String,
    pub name: String,
    pub price: String,
    pub link: String,
    pub description: String,
    pub tag: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: "[data-product-card], .product-card, .product-tile".into(),
            name: "[data-product-name], .product-name, .product-tile__name".into(),
            price: "[data-product-price], .product-price, .price".into(),
            link: "a[href]".into(),
            description: "[data-product-description], .product-description".into(),
            tag: "[data-product-tag], .product-tag, .badge".into(),
        }
    }
}

struct CompiledSelectors {
    card: Selector,
    name: Selector,
    price: Selector,
    link: Selector,
    description: Selector,
    tag: Selector,
}

impl CardSelectors {
    fn compile(&self) -> Result<CompiledSelectors, AppError> {
        Ok(CompiledSelectors {
            card: compile(&self.card)?,
            name: compile(&self.name)?,
            price: compile(&self.price)?,
            link: compile(&self.link)?,
            description: compile(&self.description)?,
            tag: compile(&self.tag)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector)
        .map_err(|e| AppError::ConfigError(format!("Invalid CSS selector '{selector}': {e:?}")))
}

/// Parser for saved product listing pages.
///
/// Two landmarks are tried in order:
/// 1. the server-rendered `__NEXT_DATA__` script holding the page state;
/// 2. repeated product-card elements matched by [`CardSelectors`].
///
/// Relative product links are resolved against the site base URL.
#[derive(Debug, Clone)]
pub struct HtmlSnapshotParser {
    base_url: String,
    selectors: CardSelectors,
    cleaner: HtmdCleaner,
}

impl Default for HtmlSnapshotParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlSnapshotParser {
    pub fn new() -> Self {
        Self {
            base_url: JCREW_BASE_URL.to_string(),
            selectors: CardSelectors::default(),
            cleaner: HtmdCleaner::new(),
        }
    }

    /// Use a different site base for resolving relative links.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, AppError> {
        Url::parse(base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid base URL '{base_url}': {e}")))?;
        self.base_url = base_url.to_string();
        Ok(self)
    }

    pub fn with_selectors(mut self, selectors: CardSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    fn base(&self) -> Result<Url, AppError> {
        Url::parse(&self.base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid base URL '{}': {e}", self.base_url)))
    }

    fn extract_next_data(&self, payload: &str, base: &Url) -> Result<ExtractedItems, AppError> {
        let payload: Value = serde_json::from_str(payload.trim()).map_err(|e| {
            AppError::SourceFormatUnrecognized(format!("Failed to decode __NEXT_DATA__ payload: {e}"))
        })?;

        let initial_state = payload
            .pointer("/props/initialState")
            .filter(|v| !v.is_null())
            .ok_or_else(|| {
                AppError::SourceFormatUnrecognized(
                    "Initial state missing from __NEXT_DATA__ payload".into(),
                )
            })?;

        let product_array = initial_state
            .pointer("/array/data/productArray")
            .filter(|v| !v.is_null())
            .ok_or_else(|| {
                AppError::SourceFormatUnrecognized("productArray key missing from page state".into())
            })?;

        let entries: Vec<&Value> = product_array
            .get("productList")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|block| block.get("products").and_then(Value::as_array))
            .flatten()
            .collect();

        if entries.is_empty() {
            return Err(AppError::SourceFormatUnrecognized(
                "No product entries discovered in page state".into(),
            ));
        }

        tracing::debug!("Found {} products in __NEXT_DATA__", entries.len());
        Ok(entries
            .into_iter()
            .map(|entry| self.state_product(entry, base))
            .collect())
    }

    fn state_product(&self, data: &Value, base: &Url) -> Result<RawProduct, ItemError> {
        if !data.is_object() {
            return Err(ItemError::Malformed(format!(
                "expected object, found {}",
                type_name(data)
            )));
        }

        let name = str_field(data, "productDescription").or_else(|| str_field(data, "productCode"));
        let description = data
            .get("promoMessageOverride")
            .and_then(Value::as_str)
            .map(|html| self.cleaner.clean(html))
            .filter(|text| !text.is_empty());

        let url = match str_field(data, "url") {
            Some(path) => Some(resolve_url(base, &path).ok_or_else(|| {
                ItemError::invalid("url", format!("cannot resolve '{path}'"))
            })?),
            None => None,
        };

        Ok(RawProduct {
            name,
            description,
            price: state_price(data),
            currency: None,
            url,
            tags: state_tags(data),
            availability: str_field(data, "extendedSize"),
            metadata: state_metadata(data),
        })
    }

    fn extract_cards(&self, document: &Html, base: &Url) -> Result<ExtractedItems, AppError> {
        let selectors = self.selectors.compile()?;
        Ok(document
            .select(&selectors.card)
            .filter(|card| !inside_card(*card, &selectors.card))
            .map(|card| self.card_product(card, &selectors, base))
            .collect())
    }

    fn card_product(
        &self,
        card: ElementRef<'_>,
        selectors: &CompiledSelectors,
        base: &Url,
    ) -> Result<RawProduct, ItemError> {
        let attrs = card.value();

        let name = attr_text(card, "data-product-name").or_else(|| first_text(card, &selectors.name));
        let price = attr_text(card, "data-price")
            .or_else(|| first_text(card, &selectors.price))
            .map(RawPrice::Text);

        let href = if attrs.name() == "a" {
            attrs.attr("href")
        } else {
            card.select(&selectors.link)
                .next()
                .and_then(|link| link.value().attr("href"))
        };
        let url = match href {
            Some(href) => Some(resolve_url(base, href).ok_or_else(|| {
                ItemError::invalid("url", format!("cannot resolve '{href}'"))
            })?),
            None => None,
        };

        let description = card
            .select(&selectors.description)
            .next()
            .map(|el| self.cleaner.clean(&el.inner_html()))
            .filter(|text| !text.is_empty());

        let mut tags: Vec<String> = attrs
            .attr("data-category")
            .map(|category| {
                category
                    .split(['|', ','])
                    .map(|part| collapse_whitespace(part).to_lowercase())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        tags.extend(
            card.select(&selectors.tag)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()).to_lowercase())
                .filter(|tag| !tag.is_empty()),
        );

        let mut metadata = std::collections::BTreeMap::new();
        if let Some(code) = attr_text(card, "data-product-id").or_else(|| attr_text(card, "data-sku")) {
            metadata.insert("product_code".to_string(), code);
        }

        Ok(RawProduct {
            name,
            description,
            price,
            currency: attr_text(card, "data-currency"),
            url,
            tags: dedupe_preserving_order(tags),
            availability: attr_text(card, "data-availability"),
            metadata,
        })
    }
}

impl SourceParser for HtmlSnapshotParser {
    fn kind(&self) -> SourceKind {
        SourceKind::HtmlSnapshot
    }

    fn extract(&self, source: &str) -> Result<ExtractedItems, AppError> {
        let base = self.base()?;
        let document = Html::parse_document(source);

        let next_data = compile(NEXT_DATA_SELECTOR)?;
        if let Some(script) = document.select(&next_data).next() {
            tracing::debug!("Using __NEXT_DATA__ landmark");
            let payload: String = script.text().collect();
            return self.extract_next_data(&payload, &base);
        }

        let cards = self.extract_cards(&document, &base)?;
        if cards.is_empty() {
            return Err(AppError::SourceFormatUnrecognized(
                "Unable to locate __NEXT_DATA__ script or product cards in supplied HTML".into(),
            ));
        }
        tracing::debug!("Found {} product cards", cards.len());
        Ok(cards)
    }
}

fn attr_text(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(collapse_whitespace)
        .filter(|v| !v.is_empty())
}

fn first_text(el: ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(|found| collapse_whitespace(&found.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

/// `searchPrice` when set and non-zero, otherwise `listPrice.amount`.
fn state_price(data: &Value) -> Option<RawPrice> {
    let search = price_field(data.get("searchPrice")).filter(|p| *p != RawPrice::Amount(0.0));
    search.or_else(|| price_field(data.pointer("/listPrice/amount")))
}

fn state_tags(data: &Value) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(category) = str_field(data, "primaryCategoryId") {
        for part in category.split('|') {
            let part = part.trim().to_lowercase();
            if !part.is_empty() && !CATEGORY_STOP_WORDS.contains(&part.as_str()) {
                tags.push(part.replace('-', " "));
            }
        }
    }

    if let Some(colors) = data.get("colors").and_then(Value::as_array) {
        tags.extend(
            colors
                .iter()
                .filter_map(|color| str_field(color, "colorName"))
                .map(|name| name.to_lowercase()),
        );
    }

    if let Some(badge) = data.get("badge").and_then(|b| str_field(b, "label")) {
        tags.push(badge.to_lowercase());
    }

    dedupe_preserving_order(tags)
}

fn state_metadata(data: &Value) -> std::collections::BTreeMap<String, String> {
    let non_zero = |text: String| (text != "0").then_some(text);
    let mappings = [
        ("product_code", str_field(data, "productCode")),
        ("primary_category", str_field(data, "primaryCategoryId")),
        ("badge", data.get("badge").and_then(|b| str_field(b, "label"))),
        ("list_price", data.get("listPrice").and_then(|p| str_field(p, "formatted"))),
        ("search_price", scalar_text(data.get("searchPrice")).and_then(non_zero)),
        ("url_path", str_field(data, "url")),
        ("rating", scalar_text(data.get("bvAverageRating")).and_then(non_zero)),
        ("reviews", scalar_text(data.get("bvReviewCount")).and_then(non_zero)),
    ];

    mappings
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
}

/// A wrapper matched by one card alternative may hold an element matched by
/// another; only the outermost one is a card.
fn inside_card(element: ElementRef<'_>, card: &Selector) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| card.matches(&ancestor))
}
