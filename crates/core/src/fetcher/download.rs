//! Media download with validation and bounded retries.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tracing::{error, info, warn};

use crate::caption::extract_hashtags;
use crate::journal::JournalEvent;
use crate::metrics;
use crate::platform::{MediaRef, PlatformError};
use crate::retry::DOWNLOAD_RETRY;
use crate::tracker::DownloadMetadata;

use super::engine::Fetcher;

/// Anything smaller is assumed corrupted or incomplete.
const MIN_MEDIA_BYTES: u64 = 50 * 1024;

/// Anything larger is suspicious but still accepted.
const MAX_MEDIA_BYTES: u64 = 100 * 1024 * 1024;

/// The container marker must appear within this many leading bytes.
const HEADER_SCAN_BYTES: u64 = 1024;

/// Allowed size drift between retry attempts before it is worth logging.
const SIZE_DRIFT_TOLERANCE: u64 = 1024;

#[derive(Debug, Error)]
pub(crate) enum DownloadError {
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Fetcher {
    /// Download one media item, validating the result and retrying on
    /// failure. Returns the local path on success; a candidate that exhausts
    /// its attempts is abandoned with no partial files left behind.
    pub(crate) async fn download_media(&self, media: &MediaRef) -> Option<PathBuf> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("reel_{}_{}.mp4", media.id, timestamp);
        let path = self.downloads_dir().join(filename);

        let mut expected_size: Option<u64> = None;
        let mut final_size = 0u64;
        let mut attempts_used = 0;
        let mut succeeded = false;

        for attempt in 1..=DOWNLOAD_RETRY.max_attempts {
            attempts_used = attempt;
            info!(
                "Download attempt {}/{} for media {}",
                attempt, DOWNLOAD_RETRY.max_attempts, media.id
            );

            match self.try_download_once(media, &path).await {
                Ok(size) => {
                    match expected_size {
                        Some(expected) if size.abs_diff(expected) > SIZE_DRIFT_TOLERANCE => {
                            warn!(
                                "File size inconsistency for {}: expected ~{}, got {}",
                                media.id, expected, size
                            );
                        }
                        Some(_) => {}
                        None => expected_size = Some(size),
                    }
                    final_size = size;
                    succeeded = true;
                    break;
                }
                Err(e) => {
                    warn!("Download attempt {} failed: {}", attempt, e);
                    remove_partials(&path).await;

                    if DOWNLOAD_RETRY.attempts_remain(attempt) {
                        let delay = DOWNLOAD_RETRY.delay_for(attempt);
                        info!("Waiting {}s before retry...", delay.as_secs());
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        if !succeeded {
            error!(
                "All {} download attempts failed for media {}",
                DOWNLOAD_RETRY.max_attempts, media.id
            );
            metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
            if let Some(journal) = self.journal() {
                journal
                    .emit(JournalEvent::DownloadFailed {
                        media_id: media.id.clone(),
                        reason: "exhausted download attempts".to_string(),
                    })
                    .await;
            }
            return None;
        }

        let metadata = DownloadMetadata {
            media_id: media.id.clone(),
            original_caption: media.caption_text.clone(),
            like_count: media.like_count,
            comment_count: media.comment_count,
            username: media.username.clone(),
            downloaded_at: Utc::now(),
            file_size_bytes: final_size,
            download_attempts: attempts_used,
            hashtags: extract_hashtags(media.caption_text.as_deref().unwrap_or_default()),
            validated: true,
        };
        if let Err(e) = metadata.write_for(&path) {
            warn!("Could not write sidecar for {}: {}", media.id, e);
        }

        if let Err(e) = self.tracker().track_download(&media.id) {
            warn!("Could not track download of {}: {}", media.id, e);
        }

        metrics::DOWNLOADS_TOTAL.with_label_values(&["ok"]).inc();
        if let Some(journal) = self.journal() {
            journal
                .emit(JournalEvent::MediaDownloaded {
                    media_id: media.id.clone(),
                    file: path.display().to_string(),
                    size_bytes: final_size,
                    attempts: attempts_used,
                })
                .await;
        }

        info!(
            "Downloaded and validated media {} ({} bytes)",
            media.id, final_size
        );
        Some(path)
    }

    async fn try_download_once(
        &self,
        media: &MediaRef,
        path: &Path,
    ) -> Result<u64, DownloadError> {
        self.platform().download(media, path).await?;
        validate_media_file(path).await
    }
}

/// Validate a downloaded file: it exists, its size is plausible, it carries
/// a recognizable container marker early on, and its reported size matches
/// what is actually readable. Returns the file size.
pub(crate) async fn validate_media_file(path: &Path) -> Result<u64, DownloadError> {
    let meta = tokio::fs::metadata(path).await.map_err(|_| {
        DownloadError::Validation(format!("downloaded file does not exist: {}", path.display()))
    })?;
    let reported = meta.len();

    if reported < MIN_MEDIA_BYTES {
        return Err(DownloadError::Validation(format!(
            "file too small ({} bytes), likely incomplete",
            reported
        )));
    }
    if reported > MAX_MEDIA_BYTES {
        warn!(
            "Large file detected ({} bytes), proceeding with caution",
            reported
        );
    }

    let mut file = tokio::fs::File::open(path).await?;

    let mut head = Vec::with_capacity(HEADER_SCAN_BYTES as usize);
    (&mut file)
        .take(HEADER_SCAN_BYTES)
        .read_to_end(&mut head)
        .await?;

    if head.len() < 12 {
        return Err(DownloadError::Validation(
            "file header too short, file appears incomplete".to_string(),
        ));
    }
    if !contains_marker(&head, b"ftyp") && !contains_marker(&head, b"moov") {
        return Err(DownloadError::Validation(
            "no recognizable video container marker in header".to_string(),
        ));
    }

    let actual = file.seek(SeekFrom::End(0)).await?;
    if actual != reported {
        return Err(DownloadError::Validation(format!(
            "file size mismatch: expected {}, got {}",
            reported, actual
        )));
    }

    Ok(reported)
}

fn contains_marker(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Remove whatever a failed attempt left behind (media file and sidecar).
async fn remove_partials(path: &Path) {
    for leftover in [path.to_path_buf(), DownloadMetadata::sidecar_path(path)] {
        match tokio::fs::remove_file(&leftover).await {
            Ok(()) => info!("Cleaned up partial file: {}", leftover.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to clean up {}: {}", leftover.display(), e),
        }
    }
}
