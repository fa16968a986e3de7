//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Posting (successes by kind/source, failures)
//! - Fetching (downloads, fetch attempts, rate-limit cooldowns)
//! - Cleanup (deletion failures)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

/// Successful posts by media kind and content source tier.
pub static POSTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pounce_posts_total", "Total content posts"),
        &["kind", "source"], // kind: "images"/"videos", source: "user"/"fetched"/"fallback"
    )
    .unwrap()
});

/// Upload attempts that failed.
pub static POST_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("pounce_post_failures_total", "Total failed post attempts").unwrap()
});

/// Media downloads by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pounce_downloads_total", "Total media download attempts"),
        &["result"], // "ok", "failed"
    )
    .unwrap()
});

/// Outer fetch attempts by outcome.
pub static FETCH_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pounce_fetch_attempts_total", "Total fetch attempts"),
        &["result"], // "content", "empty", "error"
    )
    .unwrap()
});

/// Rate-limit cooldowns applied.
pub static RATE_LIMIT_BACKOFFS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "pounce_rate_limit_backoffs_total",
        "Total rate limit cooldowns applied",
    )
    .unwrap()
});

/// Local files that could not be deleted after posting.
pub static CLEANUP_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pounce_cleanup_failures_total",
            "Total cleanup deletion failures",
        ),
        &["file_kind"], // "media", "metadata", "thumbnail"
    )
    .unwrap()
});

/// Duration of one posting pass.
pub static RUN_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("pounce_run_duration_seconds", "Duration of a posting pass")
            .buckets(vec![1.0, 5.0, 30.0, 60.0, 180.0, 600.0, 1800.0, 3600.0]),
    )
    .unwrap()
});

/// Register all core metrics with the given registry.
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(POSTS_TOTAL.clone()))?;
    registry.register(Box::new(POST_FAILURES_TOTAL.clone()))?;
    registry.register(Box::new(DOWNLOADS_TOTAL.clone()))?;
    registry.register(Box::new(FETCH_ATTEMPTS_TOTAL.clone()))?;
    registry.register(Box::new(RATE_LIMIT_BACKOFFS_TOTAL.clone()))?;
    registry.register(Box::new(CLEANUP_FAILURES_TOTAL.clone()))?;
    registry.register(Box::new(RUN_DURATION_SECONDS.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();

        POSTS_TOTAL.with_label_values(&["videos", "fetched"]).inc();

        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "pounce_posts_total"));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();
        assert!(register_metrics(&registry).is_err());
    }
}
