//! Database operations for the `stores` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns all active stores, ordered by slug for determinism.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_stores(pool: &PgPool) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(
        "SELECT id, name, slug, logo_url, website_url, is_active, created_at, updated_at \
         FROM stores \
         WHERE is_active = true \
         ORDER BY slug",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single store by its unique slug.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no store has the slug, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_store_by_slug(pool: &PgPool, slug: &str) -> Result<StoreRow, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(
        "SELECT id, name, slug, logo_url, website_url, is_active, created_at, updated_at \
         FROM stores \
         WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}
