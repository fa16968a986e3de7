use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Routine tuning knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutineConfig {
    /// Log posting intents instead of uploading. Also constrains the pass
    /// to a single post.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    /// Posts one pass aims for (live mode).
    #[serde(default = "default_target_posts")]
    pub target_posts: u32,
    /// Delay between posts of user-provided files.
    #[serde(default = "default_user_delay")]
    pub user_post_delay: DelayRange,
    /// Delay between posts of fetched or fallback content.
    #[serde(default = "default_fetched_delay")]
    pub fetched_post_delay: DelayRange,
    /// Age threshold for the end-of-pass download sweep.
    #[serde(default = "default_sweep_age_days")]
    pub sweep_age_days: u64,
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            dry_run: default_dry_run(),
            target_posts: default_target_posts(),
            user_post_delay: default_user_delay(),
            fetched_post_delay: default_fetched_delay(),
            sweep_age_days: default_sweep_age_days(),
        }
    }
}

/// An inclusive delay range, drawn from uniformly per pause.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DelayRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl DelayRange {
    pub fn jitter(&self) -> Duration {
        Duration::from_secs(fastrand::u64(self.min_secs..=self.max_secs.max(self.min_secs)))
    }
}

fn default_dry_run() -> bool {
    true
}

fn default_target_posts() -> u32 {
    2
}

fn default_user_delay() -> DelayRange {
    DelayRange {
        min_secs: 300,
        max_secs: 600,
    }
}

fn default_fetched_delay() -> DelayRange {
    DelayRange {
        min_secs: 600,
        max_secs: 1200,
    }
}

fn default_sweep_age_days() -> u64 {
    7
}
