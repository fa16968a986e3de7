//! Publishing content to the platform and cleaning up afterwards.

mod cleanup;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::journal::{JournalEvent, JournalHandle};
use crate::metrics;
use crate::platform::MediaPlatform;
use crate::tracker::{ContentTracker, MediaKind, PostedRecord};

/// Uploads local files and records what was posted.
///
/// In dry-run mode `post` only logs the intent: no network I/O and no
/// tracker mutation, but the success path is otherwise identical to the
/// caller.
pub struct Publisher {
    platform: Arc<dyn MediaPlatform>,
    tracker: Arc<dyn ContentTracker>,
    journal: Option<JournalHandle>,
    dry_run: bool,
}

impl Publisher {
    pub fn new(
        platform: Arc<dyn MediaPlatform>,
        tracker: Arc<dyn ContentTracker>,
        dry_run: bool,
    ) -> Self {
        Self {
            platform,
            tracker,
            journal: None,
            dry_run,
        }
    }

    pub fn with_journal(mut self, journal: JournalHandle) -> Self {
        self.journal = Some(journal);
        self
    }

    pub(crate) fn tracker(&self) -> &dyn ContentTracker {
        self.tracker.as_ref()
    }

    pub(crate) fn journal(&self) -> Option<&JournalHandle> {
        self.journal.as_ref()
    }

    /// Upload a file with its caption. Returns whether the post went out
    /// (dry-run always reports success). Failures are logged, never raised.
    pub async fn post(&self, path: &Path, caption: &str, source: &str) -> bool {
        if self.dry_run {
            info!("[dry-run] Would post: {}", path.display());
            let clean: String = caption
                .chars()
                .filter(|c| c.is_ascii() && !c.is_control())
                .take(100)
                .collect();
            info!("[dry-run] Caption: {}...", clean);
            return true;
        }

        if !self.platform.is_authenticated().await {
            info!("Logging in for posting...");
            if let Err(e) = self.platform.login().await {
                error!("Login failed, cannot post content: {}", e);
                return false;
            }
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let kind = MediaKind::from_path(path);
        let uploaded = match kind {
            MediaKind::Videos => {
                // Short-form clips get better reach; fall back to a plain
                // video upload when the clip endpoint rejects the file.
                info!("Uploading clip: {}", file_name);
                match self.platform.upload_clip(path, caption).await {
                    Ok(()) => {
                        info!("Posted clip: {}", file_name);
                        true
                    }
                    Err(clip_err) => {
                        warn!("Clip upload failed, trying regular video: {}", clip_err);
                        match self.platform.upload_video(path, caption).await {
                            Ok(()) => {
                                info!("Posted video: {}", file_name);
                                true
                            }
                            Err(video_err) => {
                                error!("Both clip and video upload failed: {}", video_err);
                                false
                            }
                        }
                    }
                }
            }
            MediaKind::Images => match self.platform.upload_photo(path, caption).await {
                Ok(()) => {
                    info!("Posted image: {}", file_name);
                    true
                }
                Err(e) => {
                    error!("Photo upload failed: {}", e);
                    false
                }
            },
        };

        if !uploaded {
            metrics::POST_FAILURES_TOTAL.inc();
            if let Some(journal) = &self.journal {
                journal
                    .emit(JournalEvent::PostFailed {
                        file: file_name,
                        reason: "upload rejected".to_string(),
                    })
                    .await;
            }
            return false;
        }

        let record = PostedRecord {
            file: path.display().to_string(),
            caption: caption.to_string(),
            posted_at: Utc::now().to_rfc3339(),
            source: source.to_string(),
        };
        if let Err(e) = self.tracker.record_posted(kind, record) {
            warn!("Posted {} but failed to record it: {}", file_name, e);
        }

        metrics::POSTS_TOTAL
            .with_label_values(&[kind.as_str(), source])
            .inc();
        if let Some(journal) = &self.journal {
            journal
                .emit(JournalEvent::ContentPosted {
                    file: file_name,
                    kind: kind.as_str().to_string(),
                    source: source.to_string(),
                })
                .await;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPlatform, UploadKind};
    use crate::tracker::JsonContentTracker;
    use tempfile::TempDir;

    struct Harness {
        platform: Arc<MockPlatform>,
        tracker: Arc<JsonContentTracker>,
        temp: TempDir,
    }

    fn harness() -> Harness {
        let temp = TempDir::new().unwrap();
        let platform = Arc::new(MockPlatform::new());
        let tracker = Arc::new(JsonContentTracker::new(
            temp.path().join("posted.json"),
            temp.path().join("ledger.json"),
            temp.path().join("downloads"),
        ));
        Harness {
            platform,
            tracker,
            temp,
        }
    }

    fn publisher(h: &Harness, dry_run: bool) -> Publisher {
        Publisher::new(
            Arc::clone(&h.platform) as Arc<dyn MediaPlatform>,
            Arc::clone(&h.tracker) as Arc<dyn ContentTracker>,
            dry_run,
        )
    }

    #[tokio::test]
    async fn test_dry_run_posts_nothing_and_mutates_nothing() {
        let h = harness();
        let publisher = publisher(&h, true);
        let file = h.temp.path().join("clip.mp4");
        std::fs::write(&file, b"data").unwrap();

        assert!(publisher.post(&file, "caption #cat", "fetched").await);

        // No uploads, no login, no posted record
        assert!(h.platform.uploads().await.is_empty());
        assert_eq!(h.platform.login_count(), 0);
        assert_eq!(h.tracker.posted_counts(), (0, 0));
        assert!(!h.temp.path().join("posted.json").exists());
    }

    #[tokio::test]
    async fn test_video_posts_as_clip_and_records() {
        let h = harness();
        let publisher = publisher(&h, false);
        let file = h.temp.path().join("clip.mp4");
        std::fs::write(&file, b"data").unwrap();

        assert!(publisher.post(&file, "caption", "fetched").await);

        let uploads = h.platform.uploads().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].kind, UploadKind::Clip);
        assert_eq!(h.tracker.posted_counts(), (0, 1));
    }

    #[tokio::test]
    async fn test_clip_failure_falls_back_to_video_upload() {
        let h = harness();
        h.platform.set_fail_clip_uploads(true);
        let publisher = publisher(&h, false);
        let file = h.temp.path().join("clip.mp4");
        std::fs::write(&file, b"data").unwrap();

        assert!(publisher.post(&file, "caption", "fetched").await);

        let uploads = h.platform.uploads().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].kind, UploadKind::Video);
    }

    #[tokio::test]
    async fn test_image_posts_as_photo() {
        let h = harness();
        let publisher = publisher(&h, false);
        let file = h.temp.path().join("cat.JPG");
        std::fs::write(&file, b"data").unwrap();

        assert!(publisher.post(&file, "caption", "user").await);

        let uploads = h.platform.uploads().await;
        assert_eq!(uploads[0].kind, UploadKind::Photo);
        assert_eq!(h.tracker.posted_counts(), (1, 0));
    }

    #[tokio::test]
    async fn test_upload_failure_returns_false_without_record() {
        let h = harness();
        h.platform.set_fail_all_uploads(true);
        let publisher = publisher(&h, false);
        let file = h.temp.path().join("clip.mp4");
        std::fs::write(&file, b"data").unwrap();

        assert!(!publisher.post(&file, "caption", "fetched").await);
        assert_eq!(h.tracker.posted_counts(), (0, 0));
    }

    #[tokio::test]
    async fn test_login_failure_returns_false() {
        let h = harness();
        h.platform.set_fail_login(true);
        let publisher = publisher(&h, false);
        let file = h.temp.path().join("clip.mp4");
        std::fs::write(&file, b"data").unwrap();

        assert!(!publisher.post(&file, "caption", "fetched").await);
        assert!(h.platform.uploads().await.is_empty());
    }
}
