use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Timeout for a source's main deals-listing page fetch.
    pub scraper_listing_timeout_secs: u64,
    /// Timeout for per-item product-detail fetches during enrichment.
    pub scraper_detail_timeout_secs: u64,
    /// Upper bound on per-run enrichment fetches for a single source.
    pub scraper_enrich_limit: usize,
    /// Jitter bounds between successive enrichment fetches.
    pub scraper_enrich_delay_ms: (u64, u64),
    /// Jitter bounds between successive sources in one coordinator run.
    pub scraper_inter_source_delay_ms: (u64, u64),
    /// Amazon PA-API credentials; the amazon source stays disabled while
    /// either is absent.
    pub amazon_api_key: Option<String>,
    pub amazon_api_secret: Option<String>,
    /// Cron expression for scheduled runs; scheduling is off when unset.
    pub scrape_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_listing_timeout_secs",
                &self.scraper_listing_timeout_secs,
            )
            .field(
                "scraper_detail_timeout_secs",
                &self.scraper_detail_timeout_secs,
            )
            .field("scraper_enrich_limit", &self.scraper_enrich_limit)
            .field("scraper_enrich_delay_ms", &self.scraper_enrich_delay_ms)
            .field(
                "scraper_inter_source_delay_ms",
                &self.scraper_inter_source_delay_ms,
            )
            .field(
                "amazon_api_key",
                &self.amazon_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "amazon_api_secret",
                &self.amazon_api_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("scrape_cron", &self.scrape_cron)
            .finish()
    }
}
