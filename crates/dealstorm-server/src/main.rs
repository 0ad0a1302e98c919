mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use dealstorm_scraper::DealScraper;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(dealstorm_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = dealstorm_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    };
    let pool = dealstorm_db::connect_pool(&config.database_url, pool_config).await?;
    dealstorm_db::run_migrations(&pool).await?;
    let seeded = dealstorm_db::seed_stores(&pool).await?;
    let stores = dealstorm_db::list_active_stores(&pool).await?;
    let slugs: Vec<&str> = stores.iter().map(|s| s.slug.as_str()).collect();
    tracing::info!(seeded, active = ?slugs, "retailer stores ensured");

    let scraper = Arc::new(DealScraper::from_app_config(&config)?);
    let run_lock = Arc::new(Mutex::new(()));

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&scraper),
        Arc::clone(&config),
        Arc::clone(&run_lock),
    )
    .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        dealstorm_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            scraper,
            config: Arc::clone(&config),
            run_lock,
        },
        auth,
        default_rate_limit_state(),
    );

    tracing::info!(addr = %config.bind_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
