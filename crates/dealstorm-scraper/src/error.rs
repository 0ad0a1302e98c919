use thiserror::Error;

/// Errors raised at the fetch boundary of an extraction.
///
/// Extractors catch every variant and fold it into a `Failed` outcome (or
/// swallow it during per-item enrichment); nothing here escapes to the
/// coordinator as a raw error.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}
