//! Shared scrape-pipeline types.
//!
//! A [`ScrapedDeal`] exists only for the duration of one extraction run; it
//! has no identity until the coordinator upserts it by `external_id`. The
//! `external_id` is always `"{source}-{native_id}"` so that ids from
//! different retailers can never collide in the `deals` table.

use serde::{Deserialize, Serialize};

/// One normalized product listing produced by a source extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedDeal {
    /// Natural key for reconciliation: `"{source}-{native_id}"`.
    pub external_id: String,
    /// Display title, truncated to 500 chars by the extractor.
    pub title: String,
    pub description: Option<String>,
    /// Absolute URL; relative/protocol-relative forms are resolved at
    /// extraction time via [`crate::sanitize_url`].
    pub image_url: Option<String>,
    /// Always positive, rounded to cents.
    pub current_price: f64,
    /// Only meaningful when strictly greater than `current_price`; the
    /// savings calculation ignores it otherwise.
    pub original_price: Option<f64>,
    /// Absolute product page URL.
    pub product_url: String,
    pub brand: Option<String>,
    pub sku: Option<String>,
}

/// Terminal status of one source's extraction run.
///
/// `Partial` means the page was fetched and parsed but produced no deals
/// (selector miss, or a source intentionally disabled pending credentials).
/// `Failed` means the fetch itself errored — callers need the distinction
/// to know whether the retailer was reachable at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Success,
    Partial,
    Failed,
}

impl ScrapeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeStatus::Success => "success",
            ScrapeStatus::Partial => "partial",
            ScrapeStatus::Failed => "failed",
        }
    }
}

/// The result of one source extractor invocation. Extractors never return
/// `Err`; every anticipated failure is folded into `status` and `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    /// Source identifier, e.g. `"walmart"`.
    pub source: String,
    pub status: ScrapeStatus,
    /// Deals in document order. Order carries no meaning beyond making
    /// test assertions deterministic.
    pub deals: Vec<ScrapedDeal>,
    /// Present iff `status == Failed`, or for the credentials-missing
    /// `Partial` case.
    pub error: Option<String>,
    /// Wall-clock duration of the extraction attempt.
    pub duration_ms: u64,
}

impl ScrapeOutcome {
    /// Builds the outcome for a completed extraction: `Success` when at
    /// least one deal was produced, otherwise `Partial`.
    #[must_use]
    pub fn completed(source: &str, deals: Vec<ScrapedDeal>, duration_ms: u64) -> Self {
        let status = if deals.is_empty() {
            ScrapeStatus::Partial
        } else {
            ScrapeStatus::Success
        };
        Self {
            source: source.to_owned(),
            status,
            deals,
            error: None,
            duration_ms,
        }
    }

    /// Builds a `Partial` outcome for a source skipped without an
    /// extraction attempt, carrying the reason it was skipped.
    #[must_use]
    pub fn skipped(source: &str, reason: String, duration_ms: u64) -> Self {
        Self {
            source: source.to_owned(),
            status: ScrapeStatus::Partial,
            deals: Vec::new(),
            error: Some(reason),
            duration_ms,
        }
    }

    /// Builds a `Failed` outcome carrying the fetch/parse error message.
    #[must_use]
    pub fn failed(source: &str, error: String, duration_ms: u64) -> Self {
        Self {
            source: source.to_owned(),
            status: ScrapeStatus::Failed,
            deals: Vec::new(),
            error: Some(error),
            duration_ms,
        }
    }
}

/// Derived discount fields, both rounded to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    pub amount: f64,
    pub percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_with_deals_is_success() {
        let deal = ScrapedDeal {
            external_id: "newegg-N82E168".to_owned(),
            title: "RTX 4070".to_owned(),
            description: None,
            image_url: None,
            current_price: 549.99,
            original_price: Some(599.99),
            product_url: "https://www.newegg.com/p/N82E168".to_owned(),
            brand: None,
            sku: None,
        };
        let outcome = ScrapeOutcome::completed("newegg", vec![deal], 120);
        assert_eq!(outcome.status, ScrapeStatus::Success);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn completed_without_deals_is_partial() {
        let outcome = ScrapeOutcome::completed("newegg", vec![], 120);
        assert_eq!(outcome.status, ScrapeStatus::Partial);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn failed_carries_error_and_empty_deals() {
        let outcome = ScrapeOutcome::failed("walmart", "connection reset".to_owned(), 30_000);
        assert_eq!(outcome.status, ScrapeStatus::Failed);
        assert!(outcome.deals.is_empty());
        assert_eq!(outcome.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ScrapeStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}
