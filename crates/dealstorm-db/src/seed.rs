//! Seed data for the `stores` table.
//!
//! The coordinator files every deal under the store whose slug matches the
//! source name, so those stores must exist before the first run. Seeding is
//! idempotent and safe to call on every startup.

use sqlx::PgPool;

use crate::DbError;

const DEFAULT_STORES: &[(&str, &str, &str)] = &[
    ("Walmart", "walmart", "https://www.walmart.com"),
    ("Newegg", "newegg", "https://www.newegg.com"),
    ("Amazon", "amazon", "https://www.amazon.com"),
];

/// Upserts the built-in retailer stores.
///
/// Returns the number of stores processed. All upserts run inside a single
/// transaction; if any operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_stores(pool: &PgPool) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for (name, slug, website_url) in DEFAULT_STORES {
        sqlx::query(
            "INSERT INTO stores (name, slug, website_url, is_active) \
             VALUES ($1, $2, $3, true) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name        = EXCLUDED.name, \
                 website_url = EXCLUDED.website_url, \
                 updated_at  = NOW()",
        )
        .bind(name)
        .bind(slug)
        .bind(website_url)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
