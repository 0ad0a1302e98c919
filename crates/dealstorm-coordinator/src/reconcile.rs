//! Upsert and expiry rules for one source's scrape result.

use dealstorm_core::{calculate_savings, is_featured_discount, ScrapedDeal};
use tracing::{debug, error, info};

use crate::store::{DealPatch, DealStore};

/// Counts produced by reconciling one source against one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub added: u32,
    pub updated: u32,
    pub expired: u64,
}

/// Applies one source's deals to its store: upsert every deal, then expire
/// active scraped deals the scrape no longer saw.
///
/// A failure on one deal only loses that deal; the rest of the batch and
/// the expiry sweep still run. An expiry failure only loses the expiry
/// count. Callers must not invoke this with an empty deal list — an empty
/// scrape means "the extractor saw nothing", not "everything expired".
pub async fn reconcile_source<S: DealStore>(
    store: &S,
    store_id: i64,
    deals: &[ScrapedDeal],
) -> ReconcileCounts {
    let mut counts = ReconcileCounts::default();
    let mut featured = 0usize;

    for deal in deals {
        let savings = calculate_savings(deal.current_price, deal.original_price);
        let is_featured = is_featured_discount(savings.as_ref());
        if is_featured {
            featured += 1;
        }

        let patch = DealPatch {
            external_id: &deal.external_id,
            title: &deal.title,
            description: deal.description.as_deref(),
            image_url: deal.image_url.as_deref(),
            current_price: deal.current_price,
            original_price: deal.original_price,
            savings,
            product_url: &deal.product_url,
            brand: deal.brand.as_deref(),
            sku: deal.sku.as_deref(),
            is_featured,
        };

        let result = match store.find_deal_id(store_id, &deal.external_id).await {
            Ok(Some(deal_id)) => store.update_deal(deal_id, &patch).await.map(|()| {
                counts.updated += 1;
            }),
            Ok(None) => store.insert_deal(store_id, &patch).await.map(|()| {
                counts.added += 1;
            }),
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            error!(
                external_id = %deal.external_id,
                error = %err,
                "failed to upsert deal; continuing with batch"
            );
        }
    }

    debug!(featured, total = deals.len(), "featured-discount deals in batch");

    let found_ids: Vec<String> = deals.iter().map(|d| d.external_id.clone()).collect();
    match store.expire_missing(store_id, &found_ids).await {
        Ok(expired) => {
            counts.expired = expired;
            if expired > 0 {
                info!(store_id, expired, "expired deals missing from this scrape");
            }
        }
        Err(err) => {
            error!(store_id, error = %err, "failed to expire missing deals");
        }
    }

    counts
}
