//! Routine lifecycle integration tests.
//!
//! These drive a full posting pass through the three content tiers with a
//! mocked platform: user files, freshly fetched content, and the
//! downloaded-but-unposted fallback.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tempfile::TempDir;

use pounce_core::{
    testing::{valid_video_bytes, MockFailure, MockPlatform, UploadKind},
    CaptionGenerator, ContentConfig, ContentTracker, Fetcher, FetcherConfig, JsonContentTracker,
    MediaPlatform, MediaRef, MediaType, PostedRecord, Publisher, RoutineConfig, RoutineError,
    RoutineRunner,
};

struct TestHarness {
    platform: Arc<MockPlatform>,
    tracker: Arc<JsonContentTracker>,
    content: ContentConfig,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let content = ContentConfig {
            user_dir: temp_dir.path().join("user_content"),
            downloads_dir: temp_dir.path().join("downloads/videos"),
            posted_path: temp_dir.path().join("posted_content.json"),
            ledger_path: temp_dir.path().join("downloaded_content.json"),
        };
        std::fs::create_dir_all(&content.user_dir).unwrap();
        std::fs::create_dir_all(&content.downloads_dir).unwrap();

        let platform = Arc::new(MockPlatform::new());
        let tracker = Arc::new(JsonContentTracker::new(
            &content.posted_path,
            &content.ledger_path,
            &content.downloads_dir,
        ));

        Self {
            platform,
            tracker,
            content,
            _temp_dir: temp_dir,
        }
    }

    fn create_runner(&self, routine: RoutineConfig) -> RoutineRunner {
        let fetcher_config = FetcherConfig {
            keywords: vec!["cats".to_string()],
            keywords_per_fetch: 1,
            ..FetcherConfig::default()
        };

        let fetcher = Fetcher::new(
            Arc::clone(&self.platform) as Arc<dyn MediaPlatform>,
            Arc::clone(&self.tracker) as Arc<dyn ContentTracker>,
            fetcher_config,
            &self.content.downloads_dir,
        );
        let captions = CaptionGenerator::new(None);
        let publisher = Publisher::new(
            Arc::clone(&self.platform) as Arc<dyn MediaPlatform>,
            Arc::clone(&self.tracker) as Arc<dyn ContentTracker>,
            routine.dry_run,
        );

        RoutineRunner::new(
            routine,
            self.content.clone(),
            Arc::clone(&self.platform) as Arc<dyn MediaPlatform>,
            Arc::clone(&self.tracker) as Arc<dyn ContentTracker>,
            fetcher,
            captions,
            publisher,
        )
    }

    fn live_config(target_posts: u32) -> RoutineConfig {
        RoutineConfig {
            dry_run: false,
            target_posts,
            ..RoutineConfig::default()
        }
    }

    fn add_user_file(&self, name: &str) -> PathBuf {
        let path = self.content.user_dir.join(name);
        std::fs::write(&path, b"user content").unwrap();
        path
    }

    fn add_downloaded_video(&self, name: &str) -> PathBuf {
        let path = self.content.downloads_dir.join(name);
        std::fs::write(&path, b"previously downloaded").unwrap();
        path
    }

    fn engaging_video(id: &str) -> MediaRef {
        MediaRef {
            id: id.to_string(),
            media_type: MediaType::Video,
            like_count: 5000,
            comment_count: 100,
            caption_text: Some("viral cat #cat".to_string()),
            username: "catlady".to_string(),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_dry_run_posts_one_user_file_without_side_effects() {
    let harness = TestHarness::new();
    harness.add_user_file("first.jpg");
    harness.add_user_file("second.jpg");

    // Default config is dry-run, which constrains the quota to 1
    let runner = harness.create_runner(RoutineConfig::default());
    let report = runner.run_once().await.unwrap();

    assert_eq!(report.quota, 1);
    assert_eq!(report.posted, 1);

    // Nothing actually went out and the tracker was never touched
    assert!(harness.platform.uploads().await.is_empty());
    assert_eq!(harness.platform.login_count(), 0);
    assert_eq!(harness.tracker.posted_counts(), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn test_fetched_content_is_posted_and_cleaned_up() {
    let harness = TestHarness::new();
    harness
        .platform
        .set_default_search(vec![TestHarness::engaging_video("fresh1")])
        .await;
    harness.platform.set_download_payload(valid_video_bytes()).await;

    let runner = harness.create_runner(TestHarness::live_config(1));
    let report = runner.run_once().await.unwrap();

    assert_eq!(report.posted, 1);

    // Posted as a clip and recorded
    let uploads = harness.platform.uploads().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].kind, UploadKind::Clip);
    assert_eq!(harness.tracker.posted_counts(), (0, 1));

    // The download (and its sidecar) were cleaned up after posting
    let leftovers: Vec<_> = std::fs::read_dir(&harness.content.downloads_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);

    // The ledger still remembers the id, preventing a re-download
    assert!(harness.tracker.is_already_downloaded("fresh1"));
}

#[tokio::test(start_paused = true)]
async fn test_fallback_tier_covers_exhausted_fetch() {
    let harness = TestHarness::new();

    // One user file, a rate-limited platform, two unposted local videos
    harness.add_user_file("mine.jpg");
    harness.platform.fail_searches(MockFailure::RateLimited).await;
    let first = harness.add_downloaded_video("reel_aaa_1.mp4");
    let second = harness.add_downloaded_video("reel_bbb_2.mp4");

    let runner = harness.create_runner(TestHarness::live_config(2));
    let report = runner.run_once().await.unwrap();

    // One post from the user tier, one from the fallback tier
    assert_eq!(report.posted, 2);

    let uploads = harness.platform.uploads().await;
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].kind, UploadKind::Photo);
    assert!(uploads[0].path.ends_with("mine.jpg"));
    assert_eq!(uploads[1].kind, UploadKind::Clip);
    assert!(uploads[1].path.ends_with("reel_aaa_1.mp4"));

    // The posted fallback file was cleaned up; the spare one remains
    assert!(!first.exists());
    assert!(second.exists());

    // User files are never deleted
    assert!(harness.content.user_dir.join("mine.jpg").exists());

    assert_eq!(harness.tracker.posted_counts(), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn test_recently_posted_files_are_not_reposted() {
    let harness = TestHarness::new();
    let path = harness.add_downloaded_video("reel_old_1.mp4");

    // Posted yesterday, so still inside the recency window
    let yesterday = (Utc::now() - ChronoDuration::days(1)).to_rfc3339();
    harness
        .tracker
        .record_posted(
            pounce_core::MediaKind::Videos,
            PostedRecord {
                file: path.display().to_string(),
                caption: "already out".to_string(),
                posted_at: yesterday,
                source: "fallback".to_string(),
            },
        )
        .unwrap();

    let runner = harness.create_runner(TestHarness::live_config(1));
    let report = runner.run_once().await.unwrap();

    assert_eq!(report.posted, 0);
    assert!(harness.platform.uploads().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_passes_are_rejected() {
    let harness = TestHarness::new();
    let runner = Arc::new(harness.create_runner(RoutineConfig::default()));

    let first = Arc::clone(&runner);
    let second = Arc::clone(&runner);
    let (a, b) = tokio::join!(first.run_once(), second.run_once());

    let rejected = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(RoutineError::RunInProgress)))
        .count();
    assert_eq!(rejected, 1, "exactly one pass should be rejected");
}

#[tokio::test(start_paused = true)]
async fn test_user_tier_fills_whole_quota_when_enough_files() {
    let harness = TestHarness::new();
    harness.add_user_file("one.jpg");
    harness.add_user_file("two.mp4");

    let runner = harness.create_runner(TestHarness::live_config(2));
    let report = runner.run_once().await.unwrap();

    assert_eq!(report.posted, 2);

    let uploads = harness.platform.uploads().await;
    assert_eq!(uploads.len(), 2);
    // Alphabetical scan order: one.jpg (photo) then two.mp4 (clip)
    assert_eq!(uploads[0].kind, UploadKind::Photo);
    assert_eq!(uploads[1].kind, UploadKind::Clip);

    // The fetch tier was never needed
    assert!(harness.platform.downloaded_ids().await.is_empty());
}
