//! Postgres-backed [`DealStore`].

use dealstorm_db::{DbError, NewScraperLog, ScrapedDealRecord};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use crate::store::{DealPatch, DealStore, RunLogEntry};

#[derive(Debug, Error)]
pub enum PgStoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("price not representable as decimal: {0}")]
    Price(#[from] rust_decimal::Error),
}

/// Production store backed by the shared connection pool.
#[derive(Clone)]
pub struct PgDealStore {
    pool: PgPool,
}

impl PgDealStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_record<'a>(patch: &'a DealPatch<'a>) -> Result<ScrapedDealRecord<'a>, PgStoreError> {
    Ok(ScrapedDealRecord {
        external_id: patch.external_id,
        title: patch.title,
        description: patch.description,
        image_url: patch.image_url,
        current_price: Decimal::try_from(patch.current_price)?,
        original_price: patch
            .original_price
            .map(Decimal::try_from)
            .transpose()?,
        savings_amount: patch
            .savings
            .map(|s| Decimal::try_from(s.amount))
            .transpose()?,
        savings_percent: patch
            .savings
            .map(|s| Decimal::try_from(s.percent))
            .transpose()?,
        product_url: patch.product_url,
        brand: patch.brand,
        sku: patch.sku,
        is_featured: patch.is_featured,
    })
}

fn clamp_count(value: i32) -> i32 {
    value.max(0)
}

impl DealStore for PgDealStore {
    type Error = PgStoreError;

    async fn store_id_for_slug(&self, slug: &str) -> Result<Option<i64>, Self::Error> {
        match dealstorm_db::get_store_by_slug(&self.pool, slug).await {
            Ok(row) => Ok(row.is_active.then_some(row.id)),
            Err(DbError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_deal_id(
        &self,
        store_id: i64,
        external_id: &str,
    ) -> Result<Option<i64>, Self::Error> {
        let row = dealstorm_db::find_deal_by_external_id(&self.pool, store_id, external_id).await?;
        Ok(row.map(|r| r.id))
    }

    async fn insert_deal(&self, store_id: i64, patch: &DealPatch<'_>) -> Result<(), Self::Error> {
        let record = to_record(patch)?;
        dealstorm_db::insert_scraped_deal(&self.pool, store_id, &record).await?;
        Ok(())
    }

    async fn update_deal(&self, deal_id: i64, patch: &DealPatch<'_>) -> Result<(), Self::Error> {
        let record = to_record(patch)?;
        dealstorm_db::update_deal_from_scrape(&self.pool, deal_id, &record).await?;
        Ok(())
    }

    async fn expire_missing(
        &self,
        store_id: i64,
        found_external_ids: &[String],
    ) -> Result<u64, Self::Error> {
        let expired =
            dealstorm_db::expire_missing_deals(&self.pool, store_id, found_external_ids).await?;
        Ok(expired)
    }

    async fn active_deal_count(&self, store_id: i64) -> Result<usize, Self::Error> {
        let rows = dealstorm_db::list_active_scraped_deals(&self.pool, store_id).await?;
        Ok(rows.len())
    }

    async fn record_log(&self, entry: &RunLogEntry) -> Result<(), Self::Error> {
        let log = NewScraperLog {
            source: &entry.source,
            status: entry.status.as_str(),
            deals_found: clamp_count(entry.deals_found),
            deals_added: clamp_count(entry.deals_added),
            deals_updated: clamp_count(entry.deals_updated),
            deals_expired: clamp_count(entry.deals_expired),
            error_message: entry.error.as_deref(),
            duration_ms: i32::try_from(entry.duration_ms).unwrap_or(i32::MAX),
            started_at: entry.started_at,
        };
        dealstorm_db::insert_scraper_log(&self.pool, &log).await?;
        Ok(())
    }
}
