//! Database operations for the `scraper_logs` table.
//!
//! Log rows are append-only: one row per source per run, written after
//! that source's reconciliation finishes, and never updated afterwards.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scraper_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScraperLogRow {
    pub id: i64,
    pub public_id: Uuid,
    pub source: String,
    pub status: String,
    pub deals_found: i32,
    pub deals_added: i32,
    pub deals_updated: i32,
    pub deals_expired: i32,
    pub error_message: Option<String>,
    pub duration_ms: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert parameters for one log row. Counts are for this source only,
/// not running totals across the run.
#[derive(Debug, Clone)]
pub struct NewScraperLog<'a> {
    pub source: &'a str,
    pub status: &'a str,
    pub deals_found: i32,
    pub deals_added: i32,
    pub deals_updated: i32,
    pub deals_expired: i32,
    pub error_message: Option<&'a str>,
    pub duration_ms: i32,
    pub started_at: DateTime<Utc>,
}

/// Appends one log row with `completed_at = NOW()`.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_scraper_log(
    pool: &PgPool,
    log: &NewScraperLog<'_>,
) -> Result<ScraperLogRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ScraperLogRow>(
        "INSERT INTO scraper_logs \
             (public_id, source, status, deals_found, deals_added, deals_updated, \
              deals_expired, error_message, duration_ms, started_at, completed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW()) \
         RETURNING id, public_id, source, status, deals_found, deals_added, \
                   deals_updated, deals_expired, error_message, duration_ms, \
                   started_at, completed_at",
    )
    .bind(public_id)
    .bind(log.source)
    .bind(log.status)
    .bind(log.deals_found)
    .bind(log.deals_added)
    .bind(log.deals_updated)
    .bind(log.deals_expired)
    .bind(log.error_message)
    .bind(log.duration_ms)
    .bind(log.started_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the most recent `limit` log rows, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scraper_logs(pool: &PgPool, limit: i64) -> Result<Vec<ScraperLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ScraperLogRow>(
        "SELECT id, public_id, source, status, deals_found, deals_added, \
                deals_updated, deals_expired, error_message, duration_ms, \
                started_at, completed_at \
         FROM scraper_logs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
