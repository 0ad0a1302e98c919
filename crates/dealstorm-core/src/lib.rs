pub mod app_config;
pub mod config;
pub mod prices;
pub mod text;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use prices::{calculate_savings, is_featured_discount, parse_price, FEATURED_PERCENT_THRESHOLD};
pub use text::{sanitize_url, truncate};
pub use types::{ScrapeOutcome, ScrapeStatus, ScrapedDeal, Savings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
