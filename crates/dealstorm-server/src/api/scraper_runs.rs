use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use dealstorm_coordinator::{resolve_sources, run_scrapers, PgDealStore, RunSummary};
use dealstorm_scraper::Source;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RunRequest {
    /// Optional subset of source names; omitted or empty body means all.
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScraperLogItem {
    log_id: Uuid,
    source: String,
    status: String,
    deals_found: i32,
    deals_added: i32,
    deals_updated: i32,
    deals_expired: i32,
    error_message: Option<String>,
    duration_ms: i32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

/// `POST /api/v1/scraper/run` — kicks off a synchronous coordinator run.
///
/// At most one run may be in flight per process; a second trigger while one
/// is running gets a `conflict` instead of queueing behind it.
pub(super) async fn trigger_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<RunRequest>>,
) -> Result<Json<ApiResponse<RunSummary>>, ApiError> {
    let Ok(_guard) = state.run_lock.try_lock() else {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "a scraper run is already in progress",
        ));
    };

    let sources = match body.and_then(|Json(req)| req.sources) {
        Some(names) => {
            let resolved = resolve_sources(&names);
            if resolved.is_empty() {
                return Err(ApiError::new(
                    req_id.0,
                    "validation_error",
                    "no known sources in request",
                ));
            }
            resolved
        }
        None => Source::ALL.to_vec(),
    };

    tracing::info!(?sources, "manual scraper run triggered");
    let store = PgDealStore::new(state.pool.clone());
    let summary = run_scrapers(
        &store,
        &state.scraper,
        &sources,
        state.config.scraper_inter_source_delay_ms,
    )
    .await;

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/scraper/logs` — most recent run-log rows, newest first.
pub(super) async fn list_logs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ApiResponse<Vec<ScraperLogItem>>>, ApiError> {
    let rows = dealstorm_db::list_scraper_logs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ScraperLogItem {
            log_id: row.public_id,
            source: row.source,
            status: row.status,
            deals_found: row.deals_found,
            deals_added: row.deals_added,
            deals_updated: row.deals_updated,
            deals_expired: row.deals_expired,
            error_message: row.error_message,
            duration_ms: row.duration_ms,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::ScraperLogItem;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn scraper_log_item_is_serializable() {
        let item = ScraperLogItem {
            log_id: Uuid::new_v4(),
            source: "walmart".to_string(),
            status: "success".to_string(),
            deals_found: 24,
            deals_added: 3,
            deals_updated: 21,
            deals_expired: 2,
            error_message: None,
            duration_ms: 8_421,
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };

        let json = serde_json::to_string(&item).expect("serialize scraper log");
        assert!(json.contains("\"source\":\"walmart\""));
        assert!(json.contains("\"deals_expired\":2"));
    }
}
