//! Hashtag search and candidate selection.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::journal::JournalHandle;
use crate::platform::{MediaPlatform, MediaRef, MediaType, PlatformError};
use crate::tracker::ContentTracker;

use super::backoff::rate_limit_backoff;
use super::FetcherConfig;

/// Backoff attempts allowed per keyword before the fetch pass gives up.
const KEYWORD_BACKOFF_ATTEMPTS: u32 = 3;

/// Finds, filters and downloads new content from the platform.
pub struct Fetcher {
    platform: Arc<dyn MediaPlatform>,
    tracker: Arc<dyn ContentTracker>,
    config: FetcherConfig,
    downloads_dir: PathBuf,
    journal: Option<JournalHandle>,
}

impl Fetcher {
    pub fn new(
        platform: Arc<dyn MediaPlatform>,
        tracker: Arc<dyn ContentTracker>,
        config: FetcherConfig,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            platform,
            tracker,
            config,
            downloads_dir: downloads_dir.into(),
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: JournalHandle) -> Self {
        self.journal = Some(journal);
        self
    }

    pub(crate) fn platform(&self) -> &dyn MediaPlatform {
        self.platform.as_ref()
    }

    pub(crate) fn tracker(&self) -> &dyn ContentTracker {
        self.tracker.as_ref()
    }

    pub(crate) fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub(crate) fn journal(&self) -> Option<&JournalHandle> {
        self.journal.as_ref()
    }

    /// One fetch pass: sample keywords, rank tagged media by engagement and
    /// download up to `max_downloads` new, validated items within the time
    /// budget.
    ///
    /// Errors are returned only for conditions the whole pass cannot recover
    /// from (initial login failure, a failed re-login, a rate-limit cooldown
    /// whose session refresh failed); everything else is handled per keyword.
    pub async fn fetch(&self, max_downloads: usize) -> Result<Vec<PathBuf>, PlatformError> {
        let started = Instant::now();
        let budget = Duration::from_secs(self.config.time_budget_secs);
        let mut downloaded: Vec<PathBuf> = Vec::new();

        if !self.platform.is_authenticated().await {
            self.platform.login().await?;
        }

        let mut keywords = self.config.keywords.clone();
        fastrand::shuffle(&mut keywords);
        keywords.truncate(self.config.keywords_per_fetch);

        info!(
            "Searching {} keywords for up to {} new videos",
            keywords.len(),
            max_downloads
        );

        'keywords: for keyword in &keywords {
            if started.elapsed() > budget {
                warn!("Time budget reached while fetching");
                break;
            }
            if downloaded.len() >= max_downloads {
                break;
            }

            info!("Searching tag: #{}", keyword);
            let medias = match self.platform.search_by_tag(keyword, self.config.batch_size).await {
                Ok(medias) => medias,
                Err(e) if e.is_rate_limit() => {
                    warn!("Rate limit hit for #{}: {}", keyword, e);
                    if !rate_limit_backoff(
                        self.platform.as_ref(),
                        keyword,
                        1,
                        KEYWORD_BACKOFF_ATTEMPTS,
                    )
                    .await
                    {
                        // Session refresh failed; let the outer retry loop decide
                        return Err(e);
                    }
                    continue;
                }
                Err(e) if e.is_auth() => {
                    error!("Authentication error for #{}: {}", keyword, e);
                    info!("Attempting re-login...");
                    if self.platform.login().await.is_err() {
                        error!("Re-login failed, aborting fetch");
                        return Err(e);
                    }
                    continue;
                }
                Err(e) => {
                    warn!("Error searching #{}: {}", keyword, e);
                    continue;
                }
            };

            let videos = medias
                .iter()
                .filter(|m| m.media_type == MediaType::Video)
                .count();
            info!(
                "Fetched {} items from #{} ({} videos, {} images)",
                medias.len(),
                keyword,
                videos,
                medias.len() - videos
            );

            let mut candidates: Vec<&MediaRef> = Vec::new();
            for media in &medias {
                if started.elapsed() > budget {
                    warn!("Time budget reached during candidate filtering");
                    break 'keywords;
                }
                if media.media_type != MediaType::Video {
                    continue;
                }
                if self.tracker.is_already_downloaded(&media.id) {
                    debug!("Skipping duplicate: {}", media.id);
                    continue;
                }
                if media.like_count >= self.config.min_like_count
                    || media.comment_count >= self.config.min_comment_count
                {
                    debug!(
                        "Added candidate {} (likes: {}, comments: {})",
                        media.id, media.like_count, media.comment_count
                    );
                    candidates.push(media);
                }
            }
            candidates.sort_by(|a, b| b.engagement_score().cmp(&a.engagement_score()));
            info!("Found {} candidates from #{}", candidates.len(), keyword);

            for candidate in candidates.into_iter().take(self.config.max_per_keyword) {
                if started.elapsed() > budget {
                    warn!("Time budget reached before download");
                    break 'keywords;
                }
                if downloaded.len() >= max_downloads {
                    info!("Reached download limit ({})", max_downloads);
                    break;
                }
                // The tracker may have learned about this id since filtering
                if self.tracker.is_already_downloaded(&candidate.id) {
                    info!("Skipping duplicate before download: {}", candidate.id);
                    continue;
                }

                info!(
                    "Attempting download: {} (likes: {})",
                    candidate.id, candidate.like_count
                );
                if let Some(path) = self.download_media(candidate).await {
                    downloaded.push(path);
                    if downloaded.len() >= max_downloads {
                        info!("Reached download limit ({}), ready for posting", max_downloads);
                        break 'keywords;
                    }
                    tokio::time::sleep(Duration::from_secs(self.config.download_pause_secs)).await;
                }
            }

            tokio::time::sleep(Duration::from_secs(self.config.keyword_pause_secs)).await;
        }

        let elapsed = started.elapsed();
        info!(
            "Downloaded {} new videos in {:.1}s",
            downloaded.len(),
            elapsed.as_secs_f64()
        );
        if elapsed > budget {
            warn!(
                "Fetch pass exceeded its {}s time budget",
                budget.as_secs()
            );
        }

        Ok(downloaded)
    }
}
