//! Newegg deals-page extractor.
//!
//! Newegg renders its deals grid server-side, so a single listing fetch
//! plus CSS-selector extraction is enough; there is no hydration fallback
//! and no enrichment pass for this source.

use std::time::Instant;

use dealstorm_core::{parse_price, sanitize_url, truncate, ScrapeOutcome, ScrapedDeal};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use super::{elapsed_ms, DealScraper};
use crate::fetch::fetch_html;
use crate::hydration::MAX_TITLE_LEN;

pub(super) const BASE_URL: &str = "https://www.newegg.com";
const SOURCE: &str = "newegg";
const DEALS_PATH: &str = "/todays-deals";

/// Product-card selectors, most current page version first. The first
/// selector that matches anything wins; later tiers cover older layouts.
const ITEM_SELECTORS: &[&str] = &[
    ".item-cell",
    ".item-container",
    "[class*='product-card']",
    ".goods-container .goods-item",
];

pub(super) async fn scrape(scraper: &DealScraper) -> ScrapeOutcome {
    let started = Instant::now();
    let url = format!("{}{DEALS_PATH}", scraper.newegg_base);
    info!(source = SOURCE, url, "fetching deals listing");

    let html = match fetch_html(&scraper.listing_client, &url).await {
        Ok(html) => html,
        Err(err) => {
            warn!(source = SOURCE, error = %err, "listing fetch failed");
            return ScrapeOutcome::failed(SOURCE, err.to_string(), elapsed_ms(started));
        }
    };

    let deals = extract_deals(&html, &scraper.newegg_base);
    info!(source = SOURCE, count = deals.len(), "extraction complete");
    ScrapeOutcome::completed(SOURCE, deals, elapsed_ms(started))
}

fn extract_deals(html: &str, base_url: &str) -> Vec<ScrapedDeal> {
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

/// Maps one product card to a deal. Cards without a parsable item id,
/// title, or price are dropped.
fn parse_card(card: ElementRef<'_>, base_url: &str) -> Option<ScrapedDeal> {
    let link = select_first(card, "a.item-title")
        .or_else(|| select_first(card, "a[href*='/p/']"))
        .or_else(|| select_first(card, "a"))?;
    let href = link.value().attr("href")?;
    let item_id = item_id_from_href(href)?;

    let title = non_empty(inner_text(link))
        .or_else(|| select_first(card, ".item-info a").and_then(|el| non_empty(inner_text(el))))
        .or_else(|| link.value().attr("title").map(str::to_owned))?;

    let current_price = card_price(card)?;
    let original_price = select_first(card, ".price-was")
        .and_then(|el| parse_price(&inner_text(el)))
        .filter(|was| *was > current_price);

    let image_url = select_first(card, "a.item-img img")
        .or_else(|| select_first(card, "img"))
        .and_then(|img| {
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
        })
        .map(|src| sanitize_url(src, base_url));

    let brand = select_first(card, ".item-brand img")
        .and_then(|img| img.value().attr("alt").map(str::to_owned))
        .or_else(|| select_first(card, ".item-brand").and_then(|el| non_empty(inner_text(el))));

    Some(ScrapedDeal {
        external_id: format!("{SOURCE}-{item_id}"),
        title: truncate(&title, MAX_TITLE_LEN),
        description: None,
        image_url,
        current_price,
        original_price,
        product_url: sanitize_url(href, base_url),
        brand,
        sku: Some(item_id),
    })
}

/// Item ids live in either the pretty path (`/p/N82E16814137774`) or the
/// legacy query form (`Item=N82E16814137774`).
fn item_id_from_href(href: &str) -> Option<String> {
    let re = Regex::new(r"(?i)(?:/p/|Item=)([\w-]+)").expect("valid regex");
    re.captures(href)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Newegg splits the current price across `<strong>` (dollars) and
/// `<sup>` (`.cents`) inside `.price-current`. Older layouts keep it in
/// one text node, so the split form is tried first and plain text second.
fn card_price(card: ElementRef<'_>) -> Option<f64> {
    if let Some(dollars_el) = select_first(card, ".price-current strong") {
        let dollars = inner_text(dollars_el);
        let cents = select_first(card, ".price-current sup")
            .map(inner_text)
            .unwrap_or_default();
        let cents = cents.trim_start_matches('.');
        if let Some(price) = parse_price(&format!("{dollars}.{cents}")) {
            return Some(price);
        }
    }

    select_first(card, ".price-current")
        .and_then(|el| parse_price(&inner_text(el)))
        .or_else(|| select_first(card, "[class*='price']").and_then(|el| parse_price(&inner_text(el))))
}

fn select_first<'a>(scope: ElementRef<'a>, selector_str: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector_str).expect("valid selector");
    scope.select(&selector).next()
}

fn inner_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealstorm_core::ScrapeStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::sources::{ScraperSettings, Source};

    const LISTING_FIXTURE: &str = r#"
        <html><body>
        <div class="item-cells-wrap">
            <div class="item-cell">
                <a class="item-img" href="/p/N82E16814137774">
                    <img src="//c1.neweggimages.com/gpu.jpg" alt="">
                </a>
                <a class="item-title" href="https://www.newegg.com/p/N82E16814137774">
                    GIGABYTE GeForce RTX 4070 WINDFORCE OC 12G
                </a>
                <div class="item-branding">
                    <a class="item-brand" href="/GIGABYTE/BrandStore"><img alt="GIGABYTE" src="/b.png"></a>
                </div>
                <div class="item-action">
                    <ul class="price">
                        <li class="price-was">$649.99</li>
                        <li class="price-current"><span class="price-current-label"></span>$<strong>549</strong><sup>.99</sup></li>
                    </ul>
                </div>
            </div>
            <div class="item-cell">
                <a class="item-title" href="/p/2SW-0043-00037?query=1">Budget Keyboard</a>
                <div class="price-current"><strong>24</strong><sup>.95</sup></div>
            </div>
            <div class="item-cell">
                <a class="item-title" href="/no-id-here">Unidentifiable Thing</a>
                <div class="price-current"><strong>9</strong><sup>.99</sup></div>
            </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn extracts_cards_with_split_prices() {
        let deals = extract_deals(LISTING_FIXTURE, BASE_URL);
        assert_eq!(deals.len(), 2, "card without an item id must be dropped");

        let gpu = &deals[0];
        assert_eq!(gpu.external_id, "newegg-N82E16814137774");
        assert_eq!(gpu.title, "GIGABYTE GeForce RTX 4070 WINDFORCE OC 12G");
        assert_eq!(gpu.current_price, 549.99);
        assert_eq!(gpu.original_price, Some(649.99));
        assert_eq!(gpu.brand.as_deref(), Some("GIGABYTE"));
        assert_eq!(gpu.sku.as_deref(), Some("N82E16814137774"));
        assert_eq!(
            gpu.image_url.as_deref(),
            Some("https://c1.neweggimages.com/gpu.jpg")
        );
        assert_eq!(
            gpu.product_url,
            "https://www.newegg.com/p/N82E16814137774"
        );

        let keyboard = &deals[1];
        assert_eq!(keyboard.current_price, 24.95);
        assert_eq!(keyboard.original_price, None);
        assert_eq!(
            keyboard.product_url,
            "https://www.newegg.com/p/2SW-0043-00037?query=1"
        );
    }

    #[test]
    fn falls_back_to_secondary_selector_tier() {
        let html = r#"
            <div class="item-container">
                <a class="item-title" href="/Product/Product.aspx?Item=9SIA1K60A12345">Legacy Mouse</a>
                <div class="price-current">$12.50</div>
            </div>
        "#;
        let deals = extract_deals(html, BASE_URL);
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].external_id, "newegg-9SIA1K60A12345");
        assert_eq!(deals[0].current_price, 12.50);
    }

    #[test]
    fn item_id_handles_both_url_forms() {
        assert_eq!(
            item_id_from_href("/p/N82E16814137774").as_deref(),
            Some("N82E16814137774")
        );
        assert_eq!(
            item_id_from_href("/Product/Product.aspx?Item=2SW-0043").as_deref(),
            Some("2SW-0043")
        );
        assert_eq!(item_id_from_href("/todays-deals"), None);
    }

    #[test]
    fn drops_original_price_not_above_current() {
        let html = r#"
            <div class="item-cell">
                <a class="item-title" href="/p/AAA-111">Thing</a>
                <div class="price-was">$10.00</div>
                <div class="price-current"><strong>10</strong><sup>.00</sup></div>
            </div>
        "#;
        let deals = extract_deals(html, BASE_URL);
        assert_eq!(deals[0].original_price, None);
    }

    async fn test_scraper(base: &str) -> DealScraper {
        DealScraper::new(ScraperSettings {
            enrich_delay_ms: (0, 0),
            ..ScraperSettings::default()
        })
        .expect("client")
        .with_newegg_base(base)
    }

    #[tokio::test]
    async fn scrape_success_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/todays-deals"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_FIXTURE))
            .mount(&server)
            .await;

        let scraper = test_scraper(&server.uri()).await;
        let outcome = scraper.scrape(Source::Newegg).await;

        assert_eq!(outcome.status, ScrapeStatus::Success);
        assert_eq!(outcome.deals.len(), 2);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn scrape_with_no_matching_markup_is_partial() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/todays-deals"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>maintenance</body></html>"),
            )
            .mount(&server)
            .await;

        let scraper = test_scraper(&server.uri()).await;
        let outcome = scraper.scrape(Source::Newegg).await;

        assert_eq!(outcome.status, ScrapeStatus::Partial);
        assert!(outcome.deals.is_empty());
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn scrape_on_server_error_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/todays-deals"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let scraper = test_scraper(&server.uri()).await;
        let outcome = scraper.scrape(Source::Newegg).await;

        assert_eq!(outcome.status, ScrapeStatus::Failed);
        assert!(outcome.deals.is_empty());
        let error = outcome.error.expect("failed outcome carries error");
        assert!(error.contains("503"), "error was: {error}");
    }
}
