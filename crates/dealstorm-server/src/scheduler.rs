//! Background job scheduler.
//!
//! When `DEALSTORM_SCRAPE_CRON` is set, registers a job that runs the full
//! coordinator on that cron schedule. Scheduled runs share the manual
//! trigger's run lock, so a cron tick that fires while a run is in flight
//! is skipped rather than queued.

use std::sync::Arc;

use dealstorm_coordinator::{run_scrapers, PgDealStore};
use dealstorm_core::AppConfig;
use dealstorm_scraper::{DealScraper, Source};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised or
/// started, or if the configured cron expression is invalid.
pub async fn build_scheduler(
    pool: PgPool,
    scraper: Arc<DealScraper>,
    config: Arc<AppConfig>,
    run_lock: Arc<Mutex<()>>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if let Some(cron) = config.scrape_cron.clone() {
        tracing::info!(cron, "scheduled scraping enabled");
        let job = Job::new_async(cron.as_str(), move |_uuid, _scheduler| {
            let pool = pool.clone();
            let scraper = Arc::clone(&scraper);
            let config = Arc::clone(&config);
            let run_lock = Arc::clone(&run_lock);
            Box::pin(async move {
                let Ok(_guard) = run_lock.try_lock() else {
                    tracing::warn!("scheduled scrape skipped; a run is already in progress");
                    return;
                };
                tracing::info!("scheduled scraper run starting");
                let store = PgDealStore::new(pool);
                let summary = run_scrapers(
                    &store,
                    &scraper,
                    &Source::ALL,
                    config.scraper_inter_source_delay_ms,
                )
                .await;
                tracing::info!(
                    total_found = summary.total_found,
                    total_added = summary.total_added,
                    total_updated = summary.total_updated,
                    total_expired = summary.total_expired,
                    "scheduled scraper run finished"
                );
            })
        })?;
        scheduler.add(job).await?;
    } else {
        tracing::info!("DEALSTORM_SCRAPE_CRON not set; scheduled scraping disabled");
    }

    scheduler.start().await?;
    Ok(scheduler)
}
