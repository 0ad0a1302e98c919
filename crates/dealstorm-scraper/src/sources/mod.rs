//! Source extractors, one per retailer.
//!
//! Every extractor honors the same contract: `DealScraper::scrape` never
//! returns an error. A fetch failure becomes a `Failed` outcome, a parse
//! miss becomes `Partial`, and per-item problems are silently skipped.

mod amazon;
mod newegg;
mod walmart;

use std::time::Instant;

use dealstorm_core::{AppConfig, ScrapeOutcome};

use crate::error::ScraperError;
use crate::fetch::build_http_client;

/// A retailer-scraping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Walmart,
    Newegg,
    Amazon,
}

impl Source {
    /// All known sources, in the order a full run processes them.
    pub const ALL: [Source; 3] = [Source::Walmart, Source::Newegg, Source::Amazon];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Walmart => "walmart",
            Source::Newegg => "newegg",
            Source::Amazon => "amazon",
        }
    }

    /// Parses a source name; unknown names yield `None` so callers can
    /// skip them with a warning instead of failing a whole run.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Source> {
        match name {
            "walmart" => Some(Source::Walmart),
            "newegg" => Some(Source::Newegg),
            "amazon" => Some(Source::Amazon),
            _ => None,
        }
    }

    /// The store slug a source's deals are filed under.
    #[must_use]
    pub fn store_slug(self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for [`DealScraper`], split out from `AppConfig` so tests can
/// construct a scraper without a full environment.
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub listing_timeout_secs: u64,
    pub detail_timeout_secs: u64,
    pub enrich_limit: usize,
    pub enrich_delay_ms: (u64, u64),
    pub amazon_credentialed: bool,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            listing_timeout_secs: 30,
            detail_timeout_secs: 10,
            enrich_limit: 10,
            enrich_delay_ms: (500, 1000),
            amazon_credentialed: false,
        }
    }
}

/// Extraction entry point shared by all sources.
///
/// Holds two HTTP clients: a patient one for deals-listing pages and a
/// shorter-fused one for per-item detail fetches during enrichment, so a
/// slow product page cannot eat the whole run budget.
pub struct DealScraper {
    pub(crate) listing_client: reqwest::Client,
    pub(crate) detail_client: reqwest::Client,
    pub(crate) enrich_limit: usize,
    pub(crate) enrich_delay_ms: (u64, u64),
    pub(crate) amazon_credentialed: bool,
    pub(crate) walmart_base: String,
    pub(crate) newegg_base: String,
}

impl DealScraper {
    /// Builds a scraper from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be built.
    pub fn new(settings: ScraperSettings) -> Result<Self, ScraperError> {
        Ok(Self {
            listing_client: build_http_client(settings.listing_timeout_secs)?,
            detail_client: build_http_client(settings.detail_timeout_secs)?,
            enrich_limit: settings.enrich_limit,
            enrich_delay_ms: settings.enrich_delay_ms,
            amazon_credentialed: settings.amazon_credentialed,
            walmart_base: walmart::BASE_URL.to_owned(),
            newegg_base: newegg::BASE_URL.to_owned(),
        })
    }

    /// Builds a scraper from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(ScraperSettings {
            listing_timeout_secs: config.scraper_listing_timeout_secs,
            detail_timeout_secs: config.scraper_detail_timeout_secs,
            enrich_limit: config.scraper_enrich_limit,
            enrich_delay_ms: config.scraper_enrich_delay_ms,
            amazon_credentialed: config.amazon_api_key.is_some()
                && config.amazon_api_secret.is_some(),
        })
    }

    /// Points the walmart extractor at a different origin. Test hook.
    #[must_use]
    pub fn with_walmart_base(mut self, base: impl Into<String>) -> Self {
        self.walmart_base = base.into();
        self
    }

    /// Points the newegg extractor at a different origin. Test hook.
    #[must_use]
    pub fn with_newegg_base(mut self, base: impl Into<String>) -> Self {
        self.newegg_base = base.into();
        self
    }

    /// Runs one source's extraction. Infallible by contract: anticipated
    /// failures are folded into the outcome's status and error fields.
    pub async fn scrape(&self, source: Source) -> ScrapeOutcome {
        match source {
            Source::Walmart => walmart::scrape(self).await,
            Source::Newegg => newegg::scrape(self).await,
            Source::Amazon => amazon::scrape(self).await,
        }
    }
}

/// Milliseconds elapsed since `started`, saturating on overflow.
pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_round_trip() {
        for source in Source::ALL {
            assert_eq!(Source::from_name(source.as_str()), Some(source));
        }
    }

    #[test]
    fn unknown_source_name_is_none() {
        assert_eq!(Source::from_name("ebay"), None);
        assert_eq!(Source::from_name(""), None);
        assert_eq!(Source::from_name("WALMART"), None);
    }

    #[test]
    fn store_slug_matches_source_name() {
        assert_eq!(Source::Walmart.store_slug(), "walmart");
        assert_eq!(Source::Newegg.store_slug(), "newegg");
    }
}
