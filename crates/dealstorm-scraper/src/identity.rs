//! Client identity rotation and request pacing.
//!
//! Retail sites fingerprint repeat visitors on user-agent and request
//! cadence. Rotating through a small pool of real browser identities and
//! jittering the gap between fetches keeps the traffic pattern from being
//! trivially classifiable as a bot.

use std::time::Duration;

use rand::Rng;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Picks a browser identity string from the pool at random.
#[must_use]
pub fn pick_user_agent() -> &'static str {
    let idx = rand::rng().random_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Sleeps for a uniformly random duration in `[min_ms, max_ms]`.
pub async fn jittered_delay(min_ms: u64, max_ms: u64) {
    let ms = if max_ms > min_ms {
        rand::rng().random_range(min_ms..=max_ms)
    } else {
        min_ms
    };
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_comes_from_pool() {
        for _ in 0..50 {
            let ua = pick_user_agent();
            assert!(USER_AGENTS.contains(&ua));
        }
    }

    #[test]
    fn pool_has_distinct_identities() {
        let mut unique: Vec<&str> = USER_AGENTS.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), USER_AGENTS.len());
    }

    #[tokio::test]
    async fn jittered_delay_with_equal_bounds_completes() {
        // Degenerate range must not panic.
        jittered_delay(0, 0).await;
    }
}
