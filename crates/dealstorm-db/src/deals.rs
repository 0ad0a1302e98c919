//! Database operations for the `deals` table.
//!
//! Scraped deals are reconciled against `(store_id, external_id)`; manual
//! and API-sourced rows never carry the scraper's external id and are never
//! touched by the expiry sweep.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `deals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DealRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub store_id: i64,
    pub current_price: Decimal,
    pub original_price: Option<Decimal>,
    pub savings_amount: Option<Decimal>,
    pub savings_percent: Option<Decimal>,
    pub product_url: String,
    pub affiliate_url: String,
    pub external_id: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set written by the scrape pipeline, shared by insert and update.
///
/// No affiliate network is wired up yet, so `affiliate_url` is written as a
/// copy of `product_url` on both paths.
#[derive(Debug, Clone)]
pub struct ScrapedDealRecord<'a> {
    pub external_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub current_price: Decimal,
    pub original_price: Option<Decimal>,
    pub savings_amount: Option<Decimal>,
    pub savings_percent: Option<Decimal>,
    pub product_url: &'a str,
    pub brand: Option<&'a str>,
    pub sku: Option<&'a str>,
    pub is_featured: bool,
}

const DEAL_COLUMNS: &str = "id, title, description, image_url, store_id, \
     current_price, original_price, savings_amount, savings_percent, \
     product_url, affiliate_url, external_id, sku, brand, \
     is_active, is_featured, expires_at, source, created_at, updated_at";

/// Looks up a deal by its scrape-time natural key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_deal_by_external_id(
    pool: &PgPool,
    store_id: i64,
    external_id: &str,
) -> Result<Option<DealRow>, DbError> {
    let row = sqlx::query_as::<_, DealRow>(&format!(
        "SELECT {DEAL_COLUMNS} FROM deals WHERE store_id = $1 AND external_id = $2"
    ))
    .bind(store_id)
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a brand-new scraped deal, active and with `source = 'scraper'`.
///
/// Returns the new row's id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_scraped_deal(
    pool: &PgPool,
    store_id: i64,
    record: &ScrapedDealRecord<'_>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO deals \
             (title, description, image_url, store_id, \
              current_price, original_price, savings_amount, savings_percent, \
              product_url, affiliate_url, external_id, brand, sku, \
              is_active, is_featured, source) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10, $11, $12, true, $13, 'scraper') \
         RETURNING id",
    )
    .bind(record.title)
    .bind(record.description)
    .bind(record.image_url)
    .bind(store_id)
    .bind(record.current_price)
    .bind(record.original_price)
    .bind(record.savings_amount)
    .bind(record.savings_percent)
    .bind(record.product_url)
    .bind(record.external_id)
    .bind(record.brand)
    .bind(record.sku)
    .bind(record.is_featured)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Overwrites an existing deal with fresh scrape data and reactivates it:
/// `is_active = true`, `expires_at = NULL`, `source = 'scraper'`.
///
/// Fields the scrape did not produce (`image_url`, `original_price`, the
/// savings pair, `brand`, `sku`) keep their existing values via COALESCE,
/// so a temporarily degraded page cannot blank out good data.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_deal_from_scrape(
    pool: &PgPool,
    deal_id: i64,
    record: &ScrapedDealRecord<'_>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE deals SET \
             title           = $1, \
             description     = $2, \
             image_url       = COALESCE($3, image_url), \
             current_price   = $4, \
             original_price  = COALESCE($5, original_price), \
             savings_amount  = COALESCE($6, savings_amount), \
             savings_percent = COALESCE($7, savings_percent), \
             product_url     = $8, \
             affiliate_url   = $8, \
             brand           = COALESCE($9, brand), \
             sku             = COALESCE($10, sku), \
             is_active       = true, \
             is_featured     = $11, \
             expires_at      = NULL, \
             source          = 'scraper', \
             updated_at      = NOW() \
         WHERE id = $12",
    )
    .bind(record.title)
    .bind(record.description)
    .bind(record.image_url)
    .bind(record.current_price)
    .bind(record.original_price)
    .bind(record.savings_amount)
    .bind(record.savings_percent)
    .bind(record.product_url)
    .bind(record.brand)
    .bind(record.sku)
    .bind(record.is_featured)
    .bind(deal_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Returns the active scraper-sourced deals for one store.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_scraped_deals(
    pool: &PgPool,
    store_id: i64,
) -> Result<Vec<DealRow>, DbError> {
    let rows = sqlx::query_as::<_, DealRow>(&format!(
        "SELECT {DEAL_COLUMNS} FROM deals \
         WHERE store_id = $1 AND is_active = true AND source = 'scraper' \
         ORDER BY id"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deactivates active scraper-sourced deals for a store whose external id
/// was NOT seen in the current scrape. Rows with a NULL `external_id`
/// (manual entries) are untouched regardless of source.
///
/// Returns the number of deals expired.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn expire_missing_deals(
    pool: &PgPool,
    store_id: i64,
    found_external_ids: &[String],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE deals SET \
             is_active  = false, \
             expires_at = NOW(), \
             updated_at = NOW() \
         WHERE store_id = $1 \
           AND is_active = true \
           AND source = 'scraper' \
           AND external_id IS NOT NULL \
           AND NOT (external_id = ANY($2))",
    )
    .bind(store_id)
    .bind(found_external_ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
