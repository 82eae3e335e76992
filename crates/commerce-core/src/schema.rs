//! Validation of raw parser output into [`ProductRecord`]s.

use url::Url;

use crate::error::ItemError;
use crate::models::{ProductRecord, RawPrice, RawProduct};
use crate::util::collapse_whitespace;

/// Currency assumed when neither the source nor the price text names one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A numeric amount recovered from display text, with the currency its symbol implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedPrice {
    pub amount: f64,
    pub currency: Option<&'static str>,
}

/// Validate and normalize one candidate.
///
/// Rules: `name` non-blank, `price` present, finite and non-negative,
/// `url` an absolute http(s) URL, `currency` 3 to 5 ASCII letters
/// (uppercased, defaulting to [`DEFAULT_CURRENCY`]). Optional text fields are
/// whitespace-collapsed and dropped when blank.
pub fn validate(raw: RawProduct) -> Result<ProductRecord, ItemError> {
    let name = non_blank(raw.name.as_deref()).ok_or(ItemError::FieldMissingRequired("name"))?;

    let (price, implied_currency) = match raw.price {
        None => return Err(ItemError::FieldMissingRequired("price")),
        Some(RawPrice::Amount(amount)) => (amount, None),
        Some(RawPrice::Text(text)) => {
            let parsed = parse_price_text(&text)
                .ok_or_else(|| ItemError::invalid("price", format!("cannot parse '{text}'")))?;
            (parsed.amount, parsed.currency)
        }
    };
    let price = check_price(price)?;

    let currency = match non_blank(raw.currency.as_deref()) {
        Some(code) => normalize_currency(&code)?,
        None => implied_currency.unwrap_or(DEFAULT_CURRENCY).to_string(),
    };

    let url = non_blank(raw.url.as_deref()).ok_or(ItemError::FieldMissingRequired("url"))?;
    let url = check_url(&url)?;

    let tags = raw
        .tags
        .iter()
        .map(|tag| collapse_whitespace(tag))
        .filter(|tag| !tag.is_empty())
        .collect();

    let metadata = raw
        .metadata
        .into_iter()
        .filter_map(|(key, value)| {
            let value = collapse_whitespace(&value);
            (!value.is_empty()).then_some((key, value))
        })
        .collect();

    Ok(ProductRecord {
        name,
        description: non_blank(raw.description.as_deref()),
        price,
        currency,
        url,
        tags,
        availability: non_blank(raw.availability.as_deref()),
        metadata,
    })
}

/// Extract the first amount from price display text.
///
/// Currency symbols, codes and thousands separators are stripped; for ranges
/// like `"$59.50 - $79.50"` the lower bound wins. A final `,` followed by one
/// or two digits is a decimal comma (`"€1.299,50"`). A minus sign directly in
/// front of the amount (or its symbol) yields a negative amount so that
/// validation can reject it.
pub fn parse_price_text(text: &str) -> Option<ParsedPrice> {
    let text = text.trim();
    let start = text.find(|c: char| c.is_ascii_digit())?;

    let run_len = text[start..]
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(text.len() - start);
    let mut amount = parse_amount(&text[start..start + run_len])?;

    let prefix = &text[..start];
    let negative = prefix
        .trim_end_matches(|c: char| c.is_whitespace() || currency_for_symbol(c).is_some())
        .ends_with('-');
    if negative {
        amount = -amount;
    }

    let currency = text
        .chars()
        .find_map(currency_for_symbol)
        .or_else(|| currency_code_in(text));

    Some(ParsedPrice { amount, currency })
}

/// Parse a run of digits and separators, deciding which separator is the
/// decimal point.
fn parse_amount(run: &str) -> Option<f64> {
    let run = run.trim_end_matches([',', '.']);
    let decimal_comma = run.rfind(',').filter(|&i| {
        let tail = &run[i + 1..];
        (1..=2).contains(&tail.len()) && tail.chars().all(|c| c.is_ascii_digit())
    });

    let normalized = match decimal_comma {
        Some(i) => format!("{}.{}", run[..i].replace(['.', ','], ""), &run[i + 1..]),
        None if run.matches('.').count() > 1 => run.replace(['.', ','], ""),
        None => run.replace(',', ""),
    };
    normalized.parse().ok()
}

fn currency_for_symbol(c: char) -> Option<&'static str> {
    match c {
        '$' => Some("USD"),
        '€' => Some("EUR"),
        '£' => Some("GBP"),
        '¥' => Some("JPY"),
        _ => None,
    }
}

fn currency_code_in(text: &str) -> Option<&'static str> {
    const KNOWN: [&str; 6] = ["USD", "EUR", "GBP", "JPY", "CAD", "AUD"];
    text.split(|c: char| !c.is_ascii_alphabetic())
        .find_map(|word| KNOWN.iter().copied().find(|code| word.eq_ignore_ascii_case(code)))
}

fn check_price(price: f64) -> Result<f64, ItemError> {
    if !price.is_finite() {
        return Err(ItemError::invalid("price", format!("not a finite number: {price}")));
    }
    if price < 0.0 {
        return Err(ItemError::invalid("price", format!("negative value {price}")));
    }
    // Folds -0.0 into 0.0 so it never renders as "-0.00".
    Ok(price + 0.0)
}

fn normalize_currency(code: &str) -> Result<String, ItemError> {
    let valid = (3..=5).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic());
    if !valid {
        return Err(ItemError::invalid(
            "currency",
            format!("'{code}' is not a 3 to 5 letter code"),
        ));
    }
    Ok(code.to_ascii_uppercase())
}

fn check_url(raw: &str) -> Result<String, ItemError> {
    let parsed = Url::parse(raw).map_err(|e| ItemError::invalid("url", format!("'{raw}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(parsed.into()),
        _ => Err(ItemError::invalid(
            "url",
            format!("'{raw}' is not an absolute http(s) link"),
        )),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(collapse_whitespace)
        .filter(|value| !value.is_empty())
}
