//! URL and title cleanup helpers shared by all extractors.

/// Resolves a possibly-relative URL against a source's base origin.
///
/// Absolute (`http`-prefixed) URLs pass through unchanged, so the function
/// is idempotent. Protocol-relative `//host/path` URLs gain an `https:`
/// scheme rather than inheriting the page's.
#[must_use]
pub fn sanitize_url(url: &str, base_url: &str) -> String {
    if url.starts_with("http") {
        return url.to_owned();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{rest}");
    }
    if url.starts_with('/') {
        return format!("{base_url}{url}");
    }
    format!("{base_url}/{url}")
}

/// Truncates to at most `max_len` chars, replacing the tail with `"..."`.
///
/// Operates on chars, not bytes, so multibyte titles never get split in
/// the middle of a code point.
#[must_use]
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_owned();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
