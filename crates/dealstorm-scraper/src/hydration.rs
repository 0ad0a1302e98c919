//! Duck-typed search over embedded hydration JSON.
//!
//! Walmart-style listing pages embed their render state as a large JSON
//! blob (`<script id="__NEXT_DATA__">`). The shape shifts between deploys,
//! so instead of hard-coding a path we recursively search the tree for the
//! first array whose elements look like product records, then map each
//! element through a tolerant set of field-name aliases.

use dealstorm_core::{parse_price, sanitize_url, truncate, ScrapedDeal};
use serde_json::Value;

/// Recursion ceiling for all tree searches in this module. Hydration blobs
/// nest deeply but product arrays live well above this bound; the cap
/// keeps pathological payloads from walking forever.
const MAX_SEARCH_DEPTH: usize = 10;

/// Maximum title length carried into a [`ScrapedDeal`].
pub(crate) const MAX_TITLE_LEN: usize = 500;

/// Finds the first array in `value` whose elements are product-like:
/// at least one element carries both an id-like and a name-like field.
///
/// Stops at the first match so overlapping arrays never produce duplicate
/// extractions.
#[must_use]
pub fn find_product_array(value: &Value) -> Option<&Vec<Value>> {
    find_product_array_at(value, 0)
}

fn find_product_array_at(value: &Value, depth: usize) -> Option<&Vec<Value>> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    if let Value::Array(arr) = value {
        let has_products = arr.iter().any(looks_like_product);
        if has_products {
            return Some(arr);
        }
    }

    match value {
        Value::Object(map) => map
            .values()
            .find_map(|v| find_product_array_at(v, depth + 1)),
        Value::Array(arr) => arr
            .iter()
            .find_map(|v| find_product_array_at(v, depth + 1)),
        _ => None,
    }
}

fn looks_like_product(item: &Value) -> bool {
    let Value::Object(map) = item else {
        return false;
    };
    let has_id = map.contains_key("usItemId") || map.contains_key("productId");
    let has_name = map.contains_key("name") || map.contains_key("title");
    has_id && has_name
}

/// Maps one product-like JSON object to a [`ScrapedDeal`].
///
/// Field names vary across page versions; each attribute is resolved
/// through an ordered alias list. Items missing an id, name, or positive
/// current price are dropped.
#[must_use]
pub fn deal_from_hydration_item(item: &Value, source: &str, base_url: &str) -> Option<ScrapedDeal> {
    let id = string_field(item, &["usItemId", "id", "productId"])?;
    let title = string_field(item, &["name", "title"])?;

    let current_price = item
        .pointer("/priceInfo/currentPrice/price")
        .and_then(price_value)
        .or_else(|| item.get("currentPrice").and_then(price_value))
        .or_else(|| item.get("price").and_then(price_value))?;

    let original_price = item
        .pointer("/priceInfo/wasPrice/price")
        .and_then(price_value)
        .or_else(|| item.pointer("/priceInfo/listPrice/price").and_then(price_value))
        .or_else(|| item.get("wasPrice").and_then(price_value))
        .or_else(|| item.get("listPrice").and_then(price_value))
        .or_else(|| item.get("originalPrice").and_then(price_value));

    let image_url = string_field(item, &["imageUrl", "image", "thumbnailUrl"])
        .map(|u| sanitize_url(&u, base_url));
    let brand = string_field(item, &["brand"]);

    Some(ScrapedDeal {
        external_id: format!("{source}-{id}"),
        title: truncate(&title, MAX_TITLE_LEN),
        description: None,
        image_url,
        current_price,
        original_price,
        product_url: format!("{base_url}/ip/{id}"),
        brand,
        sku: None,
    })
}

/// Finds a `priceInfo` substructure carrying a current/was price pair where
/// the was price strictly exceeds the current one. Used by the enrichment
/// pass against product-detail pages.
#[must_use]
pub fn find_price_info(value: &Value) -> Option<(f64, f64)> {
    find_price_info_at(value, 0)
}

fn find_price_info_at(value: &Value, depth: usize) -> Option<(f64, f64)> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    if let Some(price_info) = value.get("priceInfo") {
        let current = price_info
            .pointer("/currentPrice/price")
            .and_then(price_value);
        let was = price_info
            .pointer("/wasPrice/price")
            .and_then(price_value)
            .or_else(|| price_info.pointer("/listPrice/price").and_then(price_value));
        if let (Some(current), Some(was)) = (current, was) {
            if was > current {
                return Some((current, was));
            }
        }
    }

    match value {
        Value::Object(map) => map.values().find_map(|v| find_price_info_at(v, depth + 1)),
        Value::Array(arr) => arr.iter().find_map(|v| find_price_info_at(v, depth + 1)),
        _ => None,
    }
}

/// Resolves the first present alias to an owned, non-empty string.
/// Numeric ids are stringified.
fn string_field(item: &Value, aliases: &[&str]) -> Option<String> {
    for key in aliases {
        match item.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Accepts a price as a JSON number or a noisy string; rejects non-positive
/// values either way.
fn price_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => {
            let v = n.as_f64()?;
            (v > 0.0).then_some((v * 100.0).round() / 100.0)
        }
        Value::String(s) => parse_price(s),
        _ => None,
    }
}
