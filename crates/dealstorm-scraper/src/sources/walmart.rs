//! Walmart deals-page extractor.
//!
//! Three phases: CSS-selector extraction over the server-rendered grid,
//! a `__NEXT_DATA__` hydration fallback when the grid markup has shifted,
//! and an enrichment pass that re-fetches the first few product pages to
//! recover "was" prices the listing omits.
//!
//! All HTML parsing happens in synchronous helpers over `&str`; parsed
//! documents are never held across an await point.

use std::time::Instant;

use dealstorm_core::{parse_price, sanitize_url, truncate, ScrapeOutcome, ScrapedDeal};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{elapsed_ms, DealScraper};
use crate::enrich::{extract_detail_prices, extract_next_data};
use crate::fetch::fetch_html;
use crate::hydration::{deal_from_hydration_item, find_product_array, MAX_TITLE_LEN};
use crate::identity::jittered_delay;

pub(super) const BASE_URL: &str = "https://www.walmart.com";
const SOURCE: &str = "walmart";
const DEALS_PATH: &str = "/shop/deals";

/// Product-card selectors, most current page version first.
const ITEM_SELECTORS: &[&str] = &[
    "[data-testid='item-stack'] [data-item-id]",
    ".search-result-gridview-item",
    "[data-automation-id='product-card']",
];

const TITLE_SELECTORS: &[&str] = &[
    "[data-automation-id='product-title']",
    ".product-title-link span",
    "a span",
];

const PRICE_SELECTORS: &[&str] = &[
    "[itemprop='price']",
    "[data-automation-id='product-price']",
    "[class*='price']",
];

const WAS_PRICE_SELECTORS: &[&str] = &[
    "[data-automation-id='strikethrough-price']",
    ".price-was",
    "del",
];

pub(super) async fn scrape(scraper: &DealScraper) -> ScrapeOutcome {
    let started = Instant::now();
    let url = format!("{}{DEALS_PATH}", scraper.walmart_base);
    info!(source = SOURCE, url, "fetching deals listing");

    let html = match fetch_html(&scraper.listing_client, &url).await {
        Ok(html) => html,
        Err(err) => {
            warn!(source = SOURCE, error = %err, "listing fetch failed");
            return ScrapeOutcome::failed(SOURCE, err.to_string(), elapsed_ms(started));
        }
    };

    let mut deals = extract_markup_deals(&html, &scraper.walmart_base);
    if deals.is_empty() {
        deals = extract_hydration_deals(&html, &scraper.walmart_base);
        if !deals.is_empty() {
            info!(
                source = SOURCE,
                count = deals.len(),
                "markup selectors missed; recovered deals from hydration payload"
            );
        }
    }

    enrich_deals(scraper, &mut deals).await;

    info!(source = SOURCE, count = deals.len(), "extraction complete");
    ScrapeOutcome::completed(SOURCE, deals, elapsed_ms(started))
}

/// Re-fetches the first `enrich_limit` product pages looking for a more
/// authoritative price pair. Per-item failures only cost that item its
/// enrichment; the listing-page prices stand.
async fn enrich_deals(scraper: &DealScraper, deals: &mut [ScrapedDeal]) {
    let limit = scraper.enrich_limit.min(deals.len());
    for idx in 0..limit {
        let url = deals[idx].product_url.clone();
        match fetch_html(&scraper.detail_client, &url).await {
            Ok(body) => {
                if let Some((current, was)) = extract_detail_prices(&body) {
                    debug!(source = SOURCE, url, current, was, "enriched prices");
                    deals[idx].current_price = current;
                    deals[idx].original_price = Some(was);
                }
            }
            Err(err) => {
                warn!(source = SOURCE, url, error = %err, "enrichment fetch failed");
            }
        }
        if idx + 1 < limit {
            let (min_ms, max_ms) = scraper.enrich_delay_ms;
            jittered_delay(min_ms, max_ms).await;
        }
    }
}

fn extract_markup_deals(html: &str, base_url: &str) -> Vec<ScrapedDeal> {
    let document = Html::parse_document(html);

    for selector_str in ITEM_SELECTORS {
        let selector = Selector::parse(selector_str).expect("valid selector");
        let cards: Vec<ElementRef<'_>> = document.select(&selector).collect();
        if cards.is_empty() {
            continue;
        }
        return cards
            .into_iter()
            .filter_map(|card| parse_card(card, base_url))
            .collect();
    }

    Vec::new()
}

/// Hydration fallback: pull `__NEXT_DATA__`, find the first product-shaped
/// array in it, and map every element through the alias table.
fn extract_hydration_deals(html: &str, base_url: &str) -> Vec<ScrapedDeal> {
    let Some(payload) = extract_next_data(html) else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_str::<Value>(&payload) else {
        return Vec::new();
    };
    let Some(items) = find_product_array(&value) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| deal_from_hydration_item(item, SOURCE, base_url))
        .collect()
}

fn parse_card(card: ElementRef<'_>, base_url: &str) -> Option<ScrapedDeal> {
    let href = select_first(card, "a[href*='/ip/']")
        .or_else(|| select_first(card, "a"))
        .and_then(|a| a.value().attr("href").map(str::to_owned));

    let item_id = card
        .value()
        .attr("data-item-id")
        .map(str::to_owned)
        .or_else(|| {
            select_first(card, "[data-item-id]")
                .and_then(|el| el.value().attr("data-item-id").map(str::to_owned))
        })
        .or_else(|| href.as_deref().and_then(item_id_from_href))?;

    let title = first_text(card, TITLE_SELECTORS)?;
    let current_price = card_price(card)?;
    let original_price = first_text(card, WAS_PRICE_SELECTORS)
        .and_then(|text| parse_price(&text))
        .filter(|was| *was > current_price);

    let image_url = select_first(card, "img")
        .and_then(|img| {
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
        })
        .map(|src| sanitize_url(src, base_url));

    let brand = select_first(card, "[data-automation-id='product-brand']")
        .map(inner_text)
        .filter(|s| !s.is_empty());

    let product_url = match href {
        Some(href) => sanitize_url(&href, base_url),
        None => format!("{base_url}/ip/{item_id}"),
    };

    Some(ScrapedDeal {
        external_id: format!("{SOURCE}-{item_id}"),
        title: truncate(&title, MAX_TITLE_LEN),
        description: None,
        image_url,
        current_price,
        original_price,
        product_url,
        brand,
        sku: None,
    })
}

/// Product URLs end in the numeric item id: `/ip/some-product-name/123456`.
fn item_id_from_href(href: &str) -> Option<String> {
    let re = Regex::new(r"/ip/(?:[^/?]+/)?(\d+)").expect("valid regex");
    re.captures(href)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_owned())
}

/// The `itemprop=price` microdata form keeps the clean value in a
/// `content` attribute; everything else is parsed from visible text.
fn card_price(card: ElementRef<'_>) -> Option<f64> {
    for selector_str in PRICE_SELECTORS {
        let Some(el) = select_first(card, selector_str) else {
            continue;
        };
        let from_attr = el.value().attr("content").and_then(parse_price);
        if let Some(price) = from_attr.or_else(|| parse_price(&inner_text(el))) {
            return Some(price);
        }
    }
    None
}

fn first_text(card: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        if let Some(el) = select_first(card, selector_str) {
            let text = inner_text(el);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn select_first<'a>(scope: ElementRef<'a>, selector_str: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector_str).expect("valid selector");
    scope.select(&selector).next()
}

fn inner_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealstorm_core::ScrapeStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::sources::{ScraperSettings, Source};

    const MARKUP_FIXTURE: &str = r#"
        <html><body>
        <div data-testid="item-stack">
            <div data-item-id="5689919121">
                <a href="/ip/apple-airpods-pro-2/5689919121">
                    <span data-automation-id="product-title">Apple AirPods Pro 2</span>
                </a>
                <div data-automation-id="product-price">
                    <span itemprop="price" content="189.00">$189.00</span>
                    <span data-automation-id="strikethrough-price">$249.00</span>
                </div>
                <span data-automation-id="product-brand">Apple</span>
                <img src="//i5.walmartimages.com/airpods.jpg">
            </div>
            <div data-item-id="1234567890">
                <a href="/ip/generic-blender/1234567890">
                    <span data-automation-id="product-title">Generic Blender</span>
                </a>
                <div class="mr1 price-main">$34.88</div>
            </div>
            <div data-item-id="0000000001">
                <a href="/ip/priceless/0000000001">
                    <span data-automation-id="product-title">No Price Item</span>
                </a>
            </div>
        </div>
        </body></html>
    "#;

    const HYDRATION_FIXTURE: &str = r#"
        <html><body>
        <div id="app">loading...</div>
        <script id="__NEXT_DATA__" type="application/json">
        {"props": {"pageProps": {"initialData": {"searchResult": {"itemStacks": [{
            "items": [
                {
                    "usItemId": "6644560775",
                    "name": "TCL 65\" 4K Roku TV",
                    "priceInfo": {
                        "currentPrice": {"price": 398.0},
                        "wasPrice": {"price": 599.0}
                    },
                    "imageUrl": "/images/tv.jpg",
                    "brand": "TCL"
                },
                {
                    "usItemId": "777",
                    "name": "Toaster",
                    "price": 19.99
                }
            ]
        }]}}}}}
        </script>
        </body></html>
    "#;

    #[test]
    fn extracts_cards_from_current_markup() {
        let deals = extract_markup_deals(MARKUP_FIXTURE, BASE_URL);
        assert_eq!(deals.len(), 2, "card without a price must be dropped");

        let airpods = &deals[0];
        assert_eq!(airpods.external_id, "walmart-5689919121");
        assert_eq!(airpods.title, "Apple AirPods Pro 2");
        assert_eq!(airpods.current_price, 189.0);
        assert_eq!(airpods.original_price, Some(249.0));
        assert_eq!(airpods.brand.as_deref(), Some("Apple"));
        assert_eq!(
            airpods.image_url.as_deref(),
            Some("https://i5.walmartimages.com/airpods.jpg")
        );
        assert_eq!(
            airpods.product_url,
            "https://www.walmart.com/ip/apple-airpods-pro-2/5689919121"
        );

        let blender = &deals[1];
        assert_eq!(blender.current_price, 34.88);
        assert_eq!(blender.original_price, None);
    }

    #[test]
    fn hydration_fallback_maps_product_array() {
        let deals = extract_hydration_deals(HYDRATION_FIXTURE, BASE_URL);
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].external_id, "walmart-6644560775");
        assert_eq!(deals[0].current_price, 398.0);
        assert_eq!(deals[0].original_price, Some(599.0));
        assert_eq!(deals[1].external_id, "walmart-777");
        assert_eq!(deals[1].original_price, None);
    }

    #[test]
    fn markup_extraction_wins_over_hydration() {
        // A page with both forms must only be extracted once, from markup.
        let combined = format!("{MARKUP_FIXTURE}{HYDRATION_FIXTURE}");
        let deals = extract_markup_deals(&combined, BASE_URL);
        assert_eq!(deals.len(), 2);
        assert!(deals[0].external_id.starts_with("walmart-5689919121"));
    }

    #[test]
    fn item_id_from_href_handles_slug_and_bare_forms() {
        assert_eq!(
            item_id_from_href("/ip/apple-airpods-pro-2/5689919121").as_deref(),
            Some("5689919121")
        );
        assert_eq!(item_id_from_href("/ip/5689919121").as_deref(), Some("5689919121"));
        assert_eq!(item_id_from_href("/shop/deals"), None);
    }

    fn test_settings() -> ScraperSettings {
        ScraperSettings {
            enrich_limit: 1,
            enrich_delay_ms: (0, 0),
            ..ScraperSettings::default()
        }
    }

    #[tokio::test]
    async fn scrape_falls_back_to_hydration_and_enriches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shop/deals"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HYDRATION_FIXTURE))
            .mount(&server)
            .await;
        // Detail page for the first hydration item; enrich_limit is 1 so
        // the second item's page is never requested.
        Mock::given(method("GET"))
            .and(path("/ip/6644560775"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<script type="application/ld+json">
                   {"offers": {"price": "379.00", "highPrice": "649.00"}}
                   </script>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let scraper = DealScraper::new(test_settings())
            .expect("client")
            .with_walmart_base(server.uri());
        let outcome = scraper.scrape(Source::Walmart).await;

        assert_eq!(outcome.status, ScrapeStatus::Success);
        assert_eq!(outcome.deals.len(), 2);
        assert_eq!(outcome.deals[0].current_price, 379.0);
        assert_eq!(outcome.deals[0].original_price, Some(649.0));
        // Second deal untouched by enrichment.
        assert_eq!(outcome.deals[1].current_price, 19.99);
    }

    #[tokio::test]
    async fn enrichment_failure_keeps_listing_prices() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shop/deals"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HYDRATION_FIXTURE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ip/6644560775"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let scraper = DealScraper::new(test_settings())
            .expect("client")
            .with_walmart_base(server.uri());
        let outcome = scraper.scrape(Source::Walmart).await;

        assert_eq!(outcome.status, ScrapeStatus::Success);
        assert_eq!(outcome.deals[0].current_price, 398.0);
        assert_eq!(outcome.deals[0].original_price, Some(599.0));
    }

    #[tokio::test]
    async fn scrape_on_connection_failure_is_failed() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let scraper = DealScraper::new(test_settings())
            .expect("client")
            .with_walmart_base(uri);
        let outcome = scraper.scrape(Source::Walmart).await;

        assert_eq!(outcome.status, ScrapeStatus::Failed);
        assert!(outcome.error.is_some());
    }
}
