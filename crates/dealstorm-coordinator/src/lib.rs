//! Run orchestration: drives each source extractor in sequence and
//! reconciles its deals into the store, producing one log row per source
//! and a roll-up summary for the caller.

use std::collections::HashMap;

use chrono::Utc;
use dealstorm_core::ScrapeStatus;
use dealstorm_scraper::{jittered_delay, DealScraper, Source};
use serde::Serialize;
use tracing::{info, warn};

pub mod pg;
pub mod reconcile;
pub mod store;

#[cfg(test)]
mod memstore;

pub use pg::{PgDealStore, PgStoreError};
pub use reconcile::{reconcile_source, ReconcileCounts};
pub use store::{DealPatch, DealStore, RunLogEntry};

/// Per-source entry in a [`RunSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub status: ScrapeStatus,
    pub deals_found: usize,
    pub deals_added: u32,
    pub deals_updated: u32,
    pub deals_expired: u64,
    /// Active scraper-sourced deals held for the store after reconciliation.
    pub deals_active: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Roll-up of one full coordinator run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub results: Vec<SourceReport>,
    pub total_found: usize,
    pub total_added: u32,
    pub total_updated: u32,
    pub total_expired: u64,
}

/// Maps requested source names to [`Source`] values, preserving order.
/// Unknown names are skipped with a warning rather than failing the run.
#[must_use]
pub fn resolve_sources(names: &[String]) -> Vec<Source> {
    names
        .iter()
        .filter_map(|name| {
            let source = Source::from_name(name);
            if source.is_none() {
                warn!(name, "unknown source requested; skipping");
            }
            source
        })
        .collect()
}

/// Runs the given sources in order against their stores.
///
/// Per source: scrape, reconcile (only when the scrape produced deals —
/// an empty or failed scrape must never trigger the expiry sweep), then
/// append one log row. A source whose store is missing is reported and
/// logged as failed without a scrape. Sources are separated by a jittered
/// politeness delay.
pub async fn run_scrapers<S: DealStore>(
    store: &S,
    scraper: &DealScraper,
    sources: &[Source],
    inter_source_delay_ms: (u64, u64),
) -> RunSummary {
    let mut summary = RunSummary::default();
    // Store ids are resolved once per run, not once per source occurrence.
    let mut store_ids: HashMap<&'static str, Option<i64>> = HashMap::new();

    for (idx, &source) in sources.iter().enumerate() {
        let slug = source.store_slug();
        let store_id = match store_ids.get(slug) {
            Some(cached) => *cached,
            None => {
                let looked_up = match store.store_id_for_slug(slug).await {
                    Ok(id) => id,
                    Err(err) => {
                        warn!(source = %source, error = %err, "store lookup failed");
                        None
                    }
                };
                store_ids.insert(slug, looked_up);
                looked_up
            }
        };

        let Some(store_id) = store_id else {
            warn!(source = %source, "no active store for source; create it first");
            let error = format!("no active store with slug \"{slug}\"");
            let entry = RunLogEntry {
                source: source.to_string(),
                status: ScrapeStatus::Failed,
                deals_found: 0,
                deals_added: 0,
                deals_updated: 0,
                deals_expired: 0,
                error: Some(error.clone()),
                duration_ms: 0,
                started_at: Utc::now(),
            };
            if let Err(err) = store.record_log(&entry).await {
                warn!(source = %source, error = %err, "failed to write scraper log row");
            }
            summary.results.push(SourceReport {
                source: source.to_string(),
                status: ScrapeStatus::Failed,
                deals_found: 0,
                deals_added: 0,
                deals_updated: 0,
                deals_expired: 0,
                deals_active: 0,
                error: Some(error),
                duration_ms: 0,
            });
            continue;
        };

        info!(source = %source, "running scraper");
        let started_at = Utc::now();
        let outcome = scraper.scrape(source).await;

        let counts = if outcome.deals.is_empty() {
            ReconcileCounts::default()
        } else {
            reconcile_source(store, store_id, &outcome.deals).await
        };

        let deals_found = outcome.deals.len();
        let entry = RunLogEntry {
            source: outcome.source.clone(),
            status: outcome.status,
            deals_found: count_i32(deals_found),
            deals_added: i32::try_from(counts.added).unwrap_or(i32::MAX),
            deals_updated: i32::try_from(counts.updated).unwrap_or(i32::MAX),
            deals_expired: i32::try_from(counts.expired).unwrap_or(i32::MAX),
            error: outcome.error.clone(),
            duration_ms: outcome.duration_ms,
            started_at,
        };
        if let Err(err) = store.record_log(&entry).await {
            warn!(source = %source, error = %err, "failed to write scraper log row");
        }

        let deals_active = match store.active_deal_count(store_id).await {
            Ok(count) => count,
            Err(err) => {
                warn!(source = %source, error = %err, "failed to count active deals");
                0
            }
        };

        summary.total_found += deals_found;
        summary.total_added += counts.added;
        summary.total_updated += counts.updated;
        summary.total_expired += counts.expired;
        summary.results.push(SourceReport {
            source: outcome.source,
            status: outcome.status,
            deals_found,
            deals_added: counts.added,
            deals_updated: counts.updated,
            deals_expired: counts.expired,
            deals_active,
            error: outcome.error,
            duration_ms: outcome.duration_ms,
        });

        if idx + 1 < sources.len() {
            let (min_ms, max_ms) = inter_source_delay_ms;
            jittered_delay(min_ms, max_ms).await;
        }
    }

    summary
}

fn count_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
