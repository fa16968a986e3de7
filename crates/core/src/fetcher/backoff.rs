//! Rate-limit backoff handling.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::metrics;
use crate::platform::MediaPlatform;

/// Base cooldown in seconds; doubles with each attempt.
const BASE_DELAY_SECS: u64 = 30;

/// Cooldowns are slept in chunks of this size so progress can be logged.
const CHUNK_SECS: u64 = 30;

/// Apply a rate-limit cooldown for `topic` and report whether the caller
/// should retry.
///
/// Sleeps `30 * 2^(attempt-1)` seconds; from the second attempt on, the
/// session is refreshed before signalling retry. Returns false when the
/// refresh fails.
pub async fn rate_limit_backoff(
    platform: &dyn MediaPlatform,
    topic: &str,
    attempt: u32,
    max_attempts: u32,
) -> bool {
    let delay_secs = BASE_DELAY_SECS << attempt.saturating_sub(1).min(8);

    warn!(
        "Rate limit detected for {} (attempt {}/{})",
        topic, attempt, max_attempts
    );
    info!("Cooling down for {}s...", delay_secs);
    metrics::RATE_LIMIT_BACKOFFS_TOTAL.inc();

    let mut remaining = delay_secs;
    while remaining > 0 {
        let chunk = remaining.min(CHUNK_SECS);
        tokio::time::sleep(Duration::from_secs(chunk)).await;
        remaining -= chunk;
        if remaining > 0 {
            info!("Rate limit cooldown: {}s remaining...", remaining);
        }
    }

    if attempt >= 2 {
        info!("Refreshing authentication after repeated rate limits...");
        if let Err(e) = platform.login().await {
            error!("Authentication refresh failed: {}", e);
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPlatform;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_sleeps_base_delay_without_relogin() {
        let platform = MockPlatform::new();

        let start = Instant::now();
        let retry = rate_limit_backoff(&platform, "cats", 1, 3).await;

        assert!(retry);
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert_eq!(platform.login_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_attempt_doubles_delay_and_refreshes_session() {
        let platform = MockPlatform::new();

        let start = Instant::now();
        let retry = rate_limit_backoff(&platform, "cats", 2, 3).await;

        assert!(retry);
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(platform.login_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_reports_do_not_retry() {
        let platform = MockPlatform::new();
        platform.set_fail_login(true);

        let retry = rate_limit_backoff(&platform, "cats", 2, 3).await;
        assert!(!retry);
    }
}
