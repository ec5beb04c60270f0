//! Value normalisation for scraped text.
//!
//! Prices use the Indonesian format: dots group thousands, a comma marks the
//! decimal part, and the words "juta" (10^6) or "miliar"/"M" (10^9) scale
//! the number.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::error::ParseError;

const JUTA: f64 = 1_000_000.0;
const MILIAR: f64 = 1_000_000_000.0;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref PRICE: Regex =
        Regex::new(r"(?i)(\d[\d.,]*)(?:\s*(miliar|milyar|juta|jt|m)\b)?").unwrap();
    static ref INTEGER: Regex = Regex::new(r"\d+").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
}

/// Parse a price such as `"Rp 1.000.000.000"` or `"Rp 500 Juta"`.
pub fn parse_price(input: &str) -> Result<f64, ParseError> {
    let text = clean_text(input);
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let captures = PRICE
        .captures(&text)
        .ok_or_else(|| ParseError::NoDigits(input.to_string()))?;

    // Only a word directly after the number scales it.
    let multiplier = match captures.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(suffix) if suffix == "juta" || suffix == "jt" => JUTA,
        Some(_) => MILIAR,
        None => 1.0,
    };

    let digits = captures.get(1).map_or("", |m| m.as_str());

    let normalised = digits
        .trim_end_matches([',', '.'])
        .replace('.', "")
        .replace(',', ".");

    let value: f64 = normalised
        .parse()
        .map_err(|_| ParseError::InvalidNumber(digits.to_string()))?;

    Ok(value * multiplier)
}

/// First run of digits as an integer, or 0.
pub fn parse_int(input: &str) -> u32 {
    INTEGER
        .find(input)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// First decimal number (dots as thousands, comma as decimal), or 0.
pub fn parse_float(input: &str) -> f64 {
    let normalised = input.trim().replace('.', "").replace(',', ".");
    DECIMAL
        .find(&normalised)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(input: &str) -> String {
    WHITESPACE.replace_all(input, " ").trim().to_string()
}

/// Resolve `href` against the page it was found on.
///
/// Absolute URLs pass through; root-relative and path-relative references
/// resolve against the page's origin and path.
pub fn make_absolute_url(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    page_url.join(href).ok().map(|u| u.to_string())
}
