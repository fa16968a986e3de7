//! Routine runner implementation.
//!
//! One pass works through three tiers until the post quota is met:
//! user-dropped files, freshly fetched content, previously downloaded but
//! unposted files. Fetched and fallback files are cleaned up whether or not
//! their post went out.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::caption::CaptionGenerator;
use crate::config::ContentConfig;
use crate::fetcher::{rate_limit_backoff, Fetcher};
use crate::journal::{JournalEvent, JournalHandle};
use crate::metrics;
use crate::platform::MediaPlatform;
use crate::publisher::Publisher;
use crate::retry::FETCH_RETRY;
use crate::tracker::{has_extension, ContentTracker, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

use super::config::RoutineConfig;
use super::types::{RoutineError, RoutineReport, RoutineStatus};

/// Inter-post delays in dry-run mode.
const DRY_RUN_USER_DELAY_SECS: u64 = 5;
const DRY_RUN_FETCHED_DELAY_SECS: u64 = 10;

/// Wait after a fetch error that is neither empty-result nor rate-limit.
const FETCH_ERROR_DELAY_SECS: u64 = 30;

/// Drives one prioritized posting pass.
pub struct RoutineRunner {
    config: RoutineConfig,
    content: ContentConfig,
    platform: Arc<dyn MediaPlatform>,
    tracker: Arc<dyn ContentTracker>,
    fetcher: Fetcher,
    captions: CaptionGenerator,
    publisher: Publisher,
    journal: Option<JournalHandle>,
    running: AtomicBool,
}

impl RoutineRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: RoutineConfig,
        content: ContentConfig,
        platform: Arc<dyn MediaPlatform>,
        tracker: Arc<dyn ContentTracker>,
        fetcher: Fetcher,
        captions: CaptionGenerator,
        publisher: Publisher,
    ) -> Self {
        Self {
            config,
            content,
            platform,
            tracker,
            fetcher,
            captions,
            publisher,
            journal: None,
            running: AtomicBool::new(false),
        }
    }

    pub fn with_journal(mut self, journal: JournalHandle) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Execute one posting pass. Rejects overlapping invocations: the JSON
    /// documents assume a single active pass.
    pub async fn run_once(&self) -> Result<RoutineReport, RoutineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Posting pass already in progress, rejecting trigger");
            if let Some(journal) = &self.journal {
                journal
                    .emit(JournalEvent::RunSkipped {
                        reason: "pass already in progress".to_string(),
                    })
                    .await;
            }
            return Err(RoutineError::RunInProgress);
        }

        let report = self.run_pass().await;
        self.running.store(false, Ordering::SeqCst);
        Ok(report)
    }

    /// Current service status for the API.
    pub fn status(&self) -> RoutineStatus {
        let (posted_images, posted_videos) = self.tracker.posted_counts();
        RoutineStatus {
            run_in_progress: self.running.load(Ordering::SeqCst),
            dry_run: self.config.dry_run,
            posted_images,
            posted_videos,
            ledger_len: self.tracker.ledger_len(),
            downloads_available: list_downloaded_videos(&self.content.downloads_dir).len(),
        }
    }

    async fn run_pass(&self) -> RoutineReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let quota = if self.config.dry_run {
            1
        } else {
            self.config.target_posts
        };

        info!("Starting posting pass {} (quota: {})", run_id, quota);
        if let Some(journal) = &self.journal {
            journal
                .emit(JournalEvent::RunStarted {
                    run_id: run_id.clone(),
                    quota,
                    dry_run: self.config.dry_run,
                })
                .await;
        }

        let mut posted = 0u32;

        // Tier 1: user-dropped files post first and are never deleted
        let user_files = scan_user_content(&self.content.user_dir);
        if !user_files.is_empty() && posted < quota {
            info!("Found {} user content files", user_files.len());
            for file in &user_files {
                if posted >= quota {
                    break;
                }
                let caption = self.captions.generate_for(file).await;
                if self.publisher.post(file, &caption, "user").await {
                    posted += 1;
                    if posted < quota {
                        self.pause_between_posts(
                            DRY_RUN_USER_DELAY_SECS,
                            &self.config.user_post_delay,
                        )
                        .await;
                    }
                }
            }
        }

        if posted < quota {
            let existing = list_downloaded_videos(&self.content.downloads_dir);
            info!("Found {} existing downloaded videos", existing.len());

            // Tier 2: fetch fresh content, one download at a time
            let remaining = (quota - posted) as usize;
            let fetched = self.fetch_with_retry(remaining.min(1)).await;
            if fetched.is_empty() {
                warn!("No new content could be downloaded this pass");
            }
            for path in &fetched {
                if posted >= quota {
                    break;
                }
                let caption = self.captions.generate_for(path).await;
                let post_ok = self.publisher.post(path, &caption, "fetched").await;
                if !post_ok {
                    warn!("Posting failed for {}, cleaning up anyway", path.display());
                }
                // Downloads never accumulate, posted or not
                if self.publisher.cleanup(path).await {
                    info!("Cleaned up: {}", path.display());
                } else {
                    warn!("Failed to clean up: {}", path.display());
                }
                if post_ok {
                    posted += 1;
                    if posted < quota {
                        self.pause_between_posts(
                            DRY_RUN_FETCHED_DELAY_SECS,
                            &self.config.fetched_post_delay,
                        )
                        .await;
                    }
                }
            }

            // Tier 3: fall back to downloads that were never posted
            if posted < quota {
                let unposted = self.tracker.filter_unposted(&existing);
                if unposted.is_empty() {
                    warn!("No unposted existing videos available");
                }
                for path in unposted.iter().take((quota - posted) as usize) {
                    let caption = self.captions.generate_for(path).await;
                    let post_ok = self.publisher.post(path, &caption, "fallback").await;
                    if !post_ok {
                        warn!(
                            "Posting failed for existing video {}, cleaning up anyway",
                            path.display()
                        );
                    }
                    if self.publisher.cleanup(path).await {
                        info!("Cleaned up existing video: {}", path.display());
                    }
                    if post_ok {
                        posted += 1;
                        if posted < quota {
                            self.pause_between_posts(
                                DRY_RUN_FETCHED_DELAY_SECS,
                                &self.config.fetched_post_delay,
                            )
                            .await;
                        }
                    }
                }
            }
        }

        self.publisher
            .sweep_old(&self.content.downloads_dir, self.config.sweep_age_days)
            .await;

        let duration_ms = started.elapsed().as_millis() as u64;
        metrics::RUN_DURATION_SECONDS.observe(duration_ms as f64 / 1000.0);
        info!("Posted {} items in this pass", posted);
        if let Some(journal) = &self.journal {
            journal
                .emit(JournalEvent::RunCompleted {
                    run_id: run_id.clone(),
                    posted,
                    duration_ms,
                })
                .await;
        }

        RoutineReport {
            run_id,
            quota,
            posted,
            duration_ms,
        }
    }

    /// Wrap the fetcher in bounded re-attempts: an empty result waits on the
    /// fetch schedule, a rate-limit error goes through the cooldown handler
    /// with the attempt number, anything else waits a flat delay.
    async fn fetch_with_retry(&self, max_downloads: usize) -> Vec<PathBuf> {
        for attempt in 1..=FETCH_RETRY.max_attempts {
            info!("Fetch attempt {}/{}", attempt, FETCH_RETRY.max_attempts);

            match self.fetcher.fetch(max_downloads).await {
                Ok(paths) if !paths.is_empty() => {
                    info!(
                        "Downloaded {} videos on attempt {}",
                        paths.len(),
                        attempt
                    );
                    metrics::FETCH_ATTEMPTS_TOTAL
                        .with_label_values(&["content"])
                        .inc();
                    if let Some(journal) = &self.journal {
                        journal
                            .emit(JournalEvent::FetchAttempt {
                                attempt,
                                max_attempts: FETCH_RETRY.max_attempts,
                                downloaded: paths.len(),
                            })
                            .await;
                    }
                    return paths;
                }
                Ok(_) => {
                    metrics::FETCH_ATTEMPTS_TOTAL
                        .with_label_values(&["empty"])
                        .inc();
                    if let Some(journal) = &self.journal {
                        journal
                            .emit(JournalEvent::FetchAttempt {
                                attempt,
                                max_attempts: FETCH_RETRY.max_attempts,
                                downloaded: 0,
                            })
                            .await;
                    }
                    if FETCH_RETRY.attempts_remain(attempt) {
                        let delay = FETCH_RETRY.delay_for(attempt);
                        info!(
                            "No content found, waiting {}s before retry...",
                            delay.as_secs()
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) if e.is_rate_limit() => {
                    metrics::FETCH_ATTEMPTS_TOTAL
                        .with_label_values(&["error"])
                        .inc();
                    if let Some(journal) = &self.journal {
                        journal
                            .emit(JournalEvent::RateLimitBackoff {
                                topic: "fetch_retry".to_string(),
                                attempt,
                                delay_secs: 30 << (attempt.saturating_sub(1)),
                            })
                            .await;
                    }
                    if !rate_limit_backoff(
                        self.platform.as_ref(),
                        "fetch_retry",
                        attempt,
                        FETCH_RETRY.max_attempts,
                    )
                    .await
                    {
                        break;
                    }
                }
                Err(e) => {
                    metrics::FETCH_ATTEMPTS_TOTAL
                        .with_label_values(&["error"])
                        .inc();
                    error!("Fetch error on attempt {}: {}", attempt, e);
                    if FETCH_RETRY.attempts_remain(attempt) {
                        tokio::time::sleep(Duration::from_secs(FETCH_ERROR_DELAY_SECS)).await;
                    }
                }
            }
        }

        Vec::new()
    }

    async fn pause_between_posts(&self, dry_run_secs: u64, range: &super::DelayRange) {
        let delay = if self.config.dry_run {
            Duration::from_secs(dry_run_secs)
        } else {
            range.jitter()
        };
        info!("Waiting {}s before next post", delay.as_secs());
        tokio::time::sleep(delay).await;
    }
}

/// Recursively collect postable files from the user content directory.
fn scan_user_content(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_media_files(dir, &mut files);
    files.sort();
    files
}

fn collect_media_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_media_files(&path, out);
        } else if has_extension(&path, IMAGE_EXTENSIONS) || has_extension(&path, VIDEO_EXTENSIONS) {
            out.push(path);
        }
    }
}

/// Video files sitting in the download directory.
fn list_downloaded_videos(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, VIDEO_EXTENSIONS))
        .collect();
    files.sort();
    files
}
