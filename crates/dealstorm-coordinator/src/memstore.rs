//! In-memory [`DealStore`] test double.
//!
//! Mirrors the Postgres semantics the coordinator relies on: update
//! reactivates and clears expiry, and the expiry sweep only touches active
//! scraper-sourced rows that carry an external id.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dealstorm_core::Savings;
use thiserror::Error;

use crate::store::{DealPatch, DealStore, RunLogEntry};

#[derive(Debug, Error)]
#[error("injected failure: {0}")]
pub struct MemoryError(pub &'static str);

#[derive(Debug, Clone)]
pub struct StoredDeal {
    pub id: i64,
    pub store_id: i64,
    pub external_id: Option<String>,
    pub title: String,
    pub current_price: f64,
    pub original_price: Option<f64>,
    pub savings: Option<Savings>,
    pub is_active: bool,
    pub is_featured: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub source: String,
}

#[derive(Default)]
pub struct MemoryStore {
    stores: HashMap<String, i64>,
    deals: Mutex<Vec<StoredDeal>>,
    logs: Mutex<Vec<RunLogEntry>>,
    fail_upserts: Mutex<HashSet<String>>,
    next_id: Mutex<i64>,
}

impl MemoryStore {
    pub fn with_store(slug: &str, id: i64) -> Self {
        let mut store = Self::default();
        store.stores.insert(slug.to_owned(), id);
        store
    }

    /// Makes every upsert of `external_id` fail, for error-isolation tests.
    pub fn fail_upsert_for(&self, external_id: &str) {
        self.fail_upserts
            .lock()
            .unwrap()
            .insert(external_id.to_owned());
    }

    pub fn deal_count(&self) -> usize {
        self.deals.lock().unwrap().len()
    }

    pub fn get_deal(&self, external_id: &str) -> Option<StoredDeal> {
        self.deals
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.external_id.as_deref() == Some(external_id))
            .cloned()
    }

    /// Adds a manually entered deal: no external id, `source = 'manual'`.
    pub fn insert_manual_deal(&self, title: &str) {
        let id = self.alloc_id();
        self.deals.lock().unwrap().push(StoredDeal {
            id,
            store_id: 1,
            external_id: None,
            title: title.to_owned(),
            current_price: 1.0,
            original_price: None,
            savings: None,
            is_active: true,
            is_featured: false,
            expires_at: None,
            source: "manual".to_owned(),
        });
    }

    pub fn manual_deal_count_active(&self) -> usize {
        self.deals
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.source == "manual" && d.is_active)
            .count()
    }

    pub fn logs(&self) -> Vec<RunLogEntry> {
        self.logs.lock().unwrap().clone()
    }

    fn alloc_id(&self) -> i64 {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        *next
    }

    fn check_injected_failure(&self, external_id: &str) -> Result<(), MemoryError> {
        if self.fail_upserts.lock().unwrap().contains(external_id) {
            return Err(MemoryError("upsert rejected"));
        }
        Ok(())
    }
}

impl DealStore for MemoryStore {
    type Error = MemoryError;

    async fn store_id_for_slug(&self, slug: &str) -> Result<Option<i64>, Self::Error> {
        Ok(self.stores.get(slug).copied())
    }

    async fn find_deal_id(
        &self,
        store_id: i64,
        external_id: &str,
    ) -> Result<Option<i64>, Self::Error> {
        Ok(self
            .deals
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.store_id == store_id && d.external_id.as_deref() == Some(external_id))
            .map(|d| d.id))
    }

    async fn insert_deal(&self, store_id: i64, patch: &DealPatch<'_>) -> Result<(), Self::Error> {
        self.check_injected_failure(patch.external_id)?;
        let id = self.alloc_id();
        self.deals.lock().unwrap().push(StoredDeal {
            id,
            store_id,
            external_id: Some(patch.external_id.to_owned()),
            title: patch.title.to_owned(),
            current_price: patch.current_price,
            original_price: patch.original_price,
            savings: patch.savings,
            is_active: true,
            is_featured: patch.is_featured,
            expires_at: None,
            source: "scraper".to_owned(),
        });
        Ok(())
    }

    async fn update_deal(&self, deal_id: i64, patch: &DealPatch<'_>) -> Result<(), Self::Error> {
        self.check_injected_failure(patch.external_id)?;
        let mut deals = self.deals.lock().unwrap();
        let deal = deals
            .iter_mut()
            .find(|d| d.id == deal_id)
            .ok_or(MemoryError("no such deal"))?;
        deal.title = patch.title.to_owned();
        deal.current_price = patch.current_price;
        deal.original_price = patch.original_price;
        deal.savings = patch.savings;
        deal.is_active = true;
        deal.is_featured = patch.is_featured;
        deal.expires_at = None;
        deal.source = "scraper".to_owned();
        Ok(())
    }

    async fn expire_missing(
        &self,
        store_id: i64,
        found_external_ids: &[String],
    ) -> Result<u64, Self::Error> {
        let mut deals = self.deals.lock().unwrap();
        let now = Utc::now();
        let mut expired = 0u64;
        for deal in deals.iter_mut() {
            let Some(external_id) = deal.external_id.as_deref() else {
                continue;
            };
            if deal.store_id == store_id
                && deal.is_active
                && deal.source == "scraper"
                && !found_external_ids.iter().any(|id| id == external_id)
            {
                deal.is_active = false;
                deal.expires_at = Some(now);
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn active_deal_count(&self, store_id: i64) -> Result<usize, Self::Error> {
        Ok(self
            .deals
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.store_id == store_id && d.is_active && d.source == "scraper")
            .count())
    }

    async fn record_log(&self, entry: &RunLogEntry) -> Result<(), Self::Error> {
        self.logs.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
