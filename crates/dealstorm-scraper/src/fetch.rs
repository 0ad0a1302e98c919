//! HTTP fetch layer shared by all source extractors.

use std::time::Duration;

use crate::error::ScraperError;
use crate::identity::pick_user_agent;

/// Builds a `reqwest::Client` with the given total-request timeout.
///
/// The user agent is NOT baked into the client; it is rotated per request
/// in [`fetch_html`] instead.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the client cannot be constructed
/// (e.g. invalid TLS config).
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, ScraperError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Fetches a page body with browser-like headers and a rotated user agent.
///
/// Network failures, timeouts, and non-2xx statuses are all surfaced as
/// errors — callers treat them uniformly as "the source was unreachable".
///
/// # Errors
///
/// - [`ScraperError::Http`] — connection, DNS, TLS, or timeout failure.
/// - [`ScraperError::UnexpectedStatus`] — any non-2xx response.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, ScraperError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, pick_user_agent())
        .header(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .header(reqwest::header::CONNECTION, "keep-alive")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    Ok(response.text().await?)
}
