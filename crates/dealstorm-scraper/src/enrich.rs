//! Product-detail-page price extraction for the enrichment pass.
//!
//! Listing pages frequently omit or understate the "was" price, so the
//! walmart extractor re-fetches the first few product pages and looks for
//! a more authoritative price pair in either a schema.org JSON-LD `Offer`
//! block or the page's own hydration JSON. Both extractors here are pure
//! string-to-prices functions; the fetch loop lives in the source module.

use regex::Regex;
use serde_json::Value;

use crate::hydration;

/// Extracts a `(current, was)` price pair from a product page, trying
/// JSON-LD first and the hydration payload second. Returns `None` unless a
/// pair with `was > current` is found — a page without a real discount
/// must not overwrite listing-page prices.
#[must_use]
pub fn extract_detail_prices(html: &str) -> Option<(f64, f64)> {
    extract_jsonld_offer_prices(html).or_else(|| extract_hydration_prices(html))
}

/// Scans `<script type="application/ld+json">` blocks for an `Offer`-like
/// shape: a `price` plus a strictly greater `highPrice`. The offer may sit
/// at the top level or under an `offers` key.
fn extract_jsonld_offer_prices(html: &str) -> Option<(f64, f64)> {
    let script_re = Regex::new(
        r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
    )
    .expect("valid regex");

    for cap in script_re.captures_iter(html) {
        let json_text = cap.get(1)?.as_str();
        let Ok(value) = serde_json::from_str::<Value>(json_text) else {
            continue;
        };

        let offers = value.get("offers").unwrap_or(&value);
        let current = offers.get("price").and_then(jsonld_price);
        let high = offers.get("highPrice").and_then(jsonld_price);

        if let (Some(current), Some(high)) = (current, high) {
            if high > current {
                return Some((current, high));
            }
        }
    }

    None
}

/// Parses the `__NEXT_DATA__` hydration blob and searches it for a
/// `priceInfo` structure with a discount.
fn extract_hydration_prices(html: &str) -> Option<(f64, f64)> {
    let payload = extract_next_data(html)?;
    let value: Value = serde_json::from_str(&payload).ok()?;
    hydration::find_price_info(&value)
}

/// Pulls the raw JSON text out of the `<script id="__NEXT_DATA__">` tag.
pub(crate) fn extract_next_data(html: &str) -> Option<String> {
    let re = Regex::new(r#"(?is)<script[^>]+id\s*=\s*["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#)
        .expect("valid regex");
    re.captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// JSON-LD prices appear as numbers or numeric strings in the wild.
fn jsonld_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| *v > 0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| *v > 0.0),
        _ => None,
    }
}
