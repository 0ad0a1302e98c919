//! Persistence seam for the reconciliation pipeline.
//!
//! The coordinator talks to storage only through [`DealStore`], so the
//! reconciliation rules can be exercised against an in-memory double while
//! production runs on Postgres via [`crate::pg::PgDealStore`].

use chrono::{DateTime, Utc};
use dealstorm_core::{ScrapeStatus, Savings};

/// The scrape-produced field set applied to a deal row on insert or update.
///
/// Prices stay `f64` here; the Postgres implementation converts to fixed
/// precision at the storage boundary.
#[derive(Debug, Clone)]
pub struct DealPatch<'a> {
    pub external_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub current_price: f64,
    pub original_price: Option<f64>,
    pub savings: Option<Savings>,
    pub product_url: &'a str,
    pub brand: Option<&'a str>,
    pub sku: Option<&'a str>,
    pub is_featured: bool,
}

/// One append-only run-log record, written per source after reconciliation.
#[derive(Debug, Clone)]
pub struct RunLogEntry {
    pub source: String,
    pub status: ScrapeStatus,
    pub deals_found: i32,
    pub deals_added: i32,
    pub deals_updated: i32,
    pub deals_expired: i32,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}

/// Storage operations the coordinator needs.
///
/// `update_deal` must also reactivate: set the row active, clear its
/// expiry, and stamp it as scraper-sourced. `expire_missing` must only
/// touch active scraper-sourced rows that carry an external id.
pub trait DealStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn store_id_for_slug(
        &self,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<Option<i64>, Self::Error>> + Send;

    fn find_deal_id(
        &self,
        store_id: i64,
        external_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<i64>, Self::Error>> + Send;

    fn insert_deal(
        &self,
        store_id: i64,
        patch: &DealPatch<'_>,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    fn update_deal(
        &self,
        deal_id: i64,
        patch: &DealPatch<'_>,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    fn expire_missing(
        &self,
        store_id: i64,
        found_external_ids: &[String],
    ) -> impl std::future::Future<Output = Result<u64, Self::Error>> + Send;

    /// Number of active scraper-sourced deals currently held for a store.
    fn active_deal_count(
        &self,
        store_id: i64,
    ) -> impl std::future::Future<Output = Result<usize, Self::Error>> + Send;

    fn record_log(
        &self,
        entry: &RunLogEntry,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;
}
