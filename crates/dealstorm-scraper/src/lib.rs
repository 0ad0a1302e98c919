//! Retailer deal extraction: HTTP fetching with identity rotation, CSS
//! selector and hydration-JSON parsing, and detail-page price enrichment.

pub mod enrich;
pub mod error;
pub mod fetch;
pub mod hydration;
pub mod identity;
pub mod sources;

pub use error::ScraperError;
pub use identity::{jittered_delay, pick_user_agent};
pub use sources::{DealScraper, ScraperSettings, Source};
