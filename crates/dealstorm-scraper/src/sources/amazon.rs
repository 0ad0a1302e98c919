//! Amazon source stub.
//!
//! Amazon actively blocks plain HTML scraping, so deal collection must go
//! through the Product Advertising API. Until that client exists this
//! source short-circuits to a `Partial` outcome whose error explains what
//! is missing, keeping run summaries and logs honest about why no amazon
//! deals appear.

use std::time::Instant;

use dealstorm_core::ScrapeOutcome;
use tracing::info;

use super::{elapsed_ms, DealScraper};

const SOURCE: &str = "amazon";

const MISSING_CREDENTIALS: &str = "Amazon requires Product Advertising API credentials; \
     set DEALSTORM_AMAZON_API_KEY and DEALSTORM_AMAZON_API_SECRET";

// TODO: wire up the PA-API v5 SearchItems client once an associate tag
// with API access is provisioned.
const API_NOT_WIRED: &str =
    "Amazon Product Advertising API collection is not implemented yet";

pub(super) async fn scrape(scraper: &DealScraper) -> ScrapeOutcome {
    let started = Instant::now();
    let reason = if scraper.amazon_credentialed {
        API_NOT_WIRED
    } else {
        MISSING_CREDENTIALS
    };
    info!(
        source = SOURCE,
        credentialed = scraper.amazon_credentialed,
        "short-circuiting without a fetch"
    );
    ScrapeOutcome::skipped(SOURCE, reason.to_owned(), elapsed_ms(started))
}
