//! Fetching new content from the platform by hashtag search.
//!
//! The fetcher samples configured keywords, filters tagged media by
//! engagement, downloads the best candidates with validation and bounded
//! retries, and hands back local file paths that are ready to post.

mod backoff;
mod download;
mod engine;

pub use backoff::rate_limit_backoff;
pub use engine::Fetcher;

use serde::{Deserialize, Serialize};

/// Fetcher tuning knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Topical keywords to sample hashtag searches from.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// How many keywords one fetch pass samples.
    #[serde(default = "default_keywords_per_fetch")]
    pub keywords_per_fetch: usize,
    /// Media items requested per keyword.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Download attempts per keyword.
    #[serde(default = "default_max_per_keyword")]
    pub max_per_keyword: usize,
    /// Minimum like count for a candidate (OR'd with the comment floor).
    #[serde(default = "default_min_like_count")]
    pub min_like_count: u64,
    /// Minimum comment count for a candidate.
    #[serde(default = "default_min_comment_count")]
    pub min_comment_count: u64,
    /// Wall-clock budget for one fetch pass.
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: u64,
    /// Pause between downloads within a keyword.
    #[serde(default = "default_download_pause_secs")]
    pub download_pause_secs: u64,
    /// Pause between keywords.
    #[serde(default = "default_keyword_pause_secs")]
    pub keyword_pause_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            keywords_per_fetch: default_keywords_per_fetch(),
            batch_size: default_batch_size(),
            max_per_keyword: default_max_per_keyword(),
            min_like_count: default_min_like_count(),
            min_comment_count: default_min_comment_count(),
            time_budget_secs: default_time_budget_secs(),
            download_pause_secs: default_download_pause_secs(),
            keyword_pause_secs: default_keyword_pause_secs(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    [
        "cat",
        "cats",
        "kitty",
        "kitten",
        "meow",
        "catlife",
        "catvideo",
        "funnycats",
        "viralcat",
        "cutecats",
        "catcompilation",
        "catlovers",
        "catsofinstagram",
        "catreels",
        "catfails",
        "catmemes",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_keywords_per_fetch() -> usize {
    5
}

fn default_batch_size() -> u32 {
    15
}

fn default_max_per_keyword() -> usize {
    2
}

fn default_min_like_count() -> u64 {
    1000
}

fn default_min_comment_count() -> u64 {
    20
}

fn default_time_budget_secs() -> u64 {
    180
}

fn default_download_pause_secs() -> u64 {
    2
}

fn default_keyword_pause_secs() -> u64 {
    3
}
