//! Mock media platform for testing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::platform::{MediaPlatform, MediaRef, PlatformError};

/// A scripted failure the mock can produce.
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    RateLimited,
    Auth,
    Api,
}

impl MockFailure {
    fn to_error(self) -> PlatformError {
        match self {
            MockFailure::RateLimited => {
                PlatformError::RateLimited("too many requests".to_string())
            }
            MockFailure::Auth => {
                PlatformError::AuthenticationFailed("login_required".to_string())
            }
            MockFailure::Api => PlatformError::Api {
                status: 500,
                message: "mock server error".to_string(),
            },
        }
    }
}

/// A recorded upload call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: PathBuf,
    pub caption: String,
    pub kind: UploadKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Photo,
    Video,
    Clip,
}

/// Mock implementation of the MediaPlatform trait.
///
/// Provides controllable behavior for testing:
/// - Scripted search results per tag (plus a default for any tag)
/// - Scripted persistent failures for search/login/uploads
/// - A configurable download payload written to the destination path
/// - Recorded uploads and downloads for assertions
pub struct MockPlatform {
    authenticated: AtomicBool,
    login_count: AtomicU32,
    fail_login: AtomicBool,
    search_results: RwLock<HashMap<String, Vec<MediaRef>>>,
    default_search: RwLock<Vec<MediaRef>>,
    search_failure: RwLock<Option<MockFailure>>,
    download_payload: RwLock<Vec<u8>>,
    fail_next_downloads: AtomicU32,
    fail_clip_uploads: AtomicBool,
    fail_all_uploads: AtomicBool,
    uploads: RwLock<Vec<RecordedUpload>>,
    downloads: RwLock<Vec<String>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            authenticated: AtomicBool::new(false),
            login_count: AtomicU32::new(0),
            fail_login: AtomicBool::new(false),
            search_results: RwLock::new(HashMap::new()),
            default_search: RwLock::new(Vec::new()),
            search_failure: RwLock::new(None),
            download_payload: RwLock::new(super::valid_video_bytes()),
            fail_next_downloads: AtomicU32::new(0),
            fail_clip_uploads: AtomicBool::new(false),
            fail_all_uploads: AtomicBool::new(false),
            uploads: RwLock::new(Vec::new()),
            downloads: RwLock::new(Vec::new()),
        }
    }

    /// Script results for a specific tag.
    pub async fn set_search_results(&self, tag: &str, results: Vec<MediaRef>) {
        self.search_results
            .write()
            .await
            .insert(tag.to_string(), results);
    }

    /// Script results returned for any tag without specific results.
    pub async fn set_default_search(&self, results: Vec<MediaRef>) {
        *self.default_search.write().await = results;
    }

    /// Make every search fail with the given failure.
    pub async fn fail_searches(&self, failure: MockFailure) {
        *self.search_failure.write().await = Some(failure);
    }

    /// Bytes written to the destination of every download.
    pub async fn set_download_payload(&self, payload: Vec<u8>) {
        *self.download_payload.write().await = payload;
    }

    /// Make the next `n` downloads fail with a connection error.
    pub fn fail_next_downloads(&self, n: u32) {
        self.fail_next_downloads.store(n, Ordering::SeqCst);
    }

    /// Make logins fail.
    pub fn set_fail_login(&self, fail: bool) {
        self.fail_login.store(fail, Ordering::SeqCst);
    }

    /// Make clip uploads fail (video/photo uploads still succeed).
    pub fn set_fail_clip_uploads(&self, fail: bool) {
        self.fail_clip_uploads.store(fail, Ordering::SeqCst);
    }

    /// Make every upload fail.
    pub fn set_fail_all_uploads(&self, fail: bool) {
        self.fail_all_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn login_count(&self) -> u32 {
        self.login_count.load(Ordering::SeqCst)
    }

    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    pub async fn downloaded_ids(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }

    async fn record_upload(
        &self,
        path: &Path,
        caption: &str,
        kind: UploadKind,
    ) -> Result<(), PlatformError> {
        if self.fail_all_uploads.load(Ordering::SeqCst) {
            return Err(PlatformError::Api {
                status: 500,
                message: "upload rejected".to_string(),
            });
        }
        if kind == UploadKind::Clip && self.fail_clip_uploads.load(Ordering::SeqCst) {
            return Err(PlatformError::Api {
                status: 500,
                message: "clip upload rejected".to_string(),
            });
        }
        self.uploads.write().await.push(RecordedUpload {
            path: path.to_path_buf(),
            caption: caption.to_string(),
            kind,
        });
        Ok(())
    }
}

#[async_trait]
impl MediaPlatform for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self) -> Result<(), PlatformError> {
        self.login_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(PlatformError::AuthenticationFailed(
                "mock login failure".to_string(),
            ));
        }
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn search_by_tag(&self, tag: &str, _limit: u32) -> Result<Vec<MediaRef>, PlatformError> {
        if let Some(failure) = *self.search_failure.read().await {
            return Err(failure.to_error());
        }
        if let Some(results) = self.search_results.read().await.get(tag) {
            return Ok(results.clone());
        }
        Ok(self.default_search.read().await.clone())
    }

    async fn download(&self, media: &MediaRef, dest: &Path) -> Result<(), PlatformError> {
        let remaining = self.fail_next_downloads.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next_downloads.store(remaining - 1, Ordering::SeqCst);
            return Err(PlatformError::ConnectionFailed(
                "mock download failure".to_string(),
            ));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = self.download_payload.read().await.clone();
        tokio::fs::write(dest, payload).await?;
        self.downloads.write().await.push(media.id.clone());
        Ok(())
    }

    async fn upload_photo(&self, path: &Path, caption: &str) -> Result<(), PlatformError> {
        self.record_upload(path, caption, UploadKind::Photo).await
    }

    async fn upload_video(&self, path: &Path, caption: &str) -> Result<(), PlatformError> {
        self.record_upload(path, caption, UploadKind::Video).await
    }

    async fn upload_clip(&self, path: &Path, caption: &str) -> Result<(), PlatformError> {
        self.record_upload(path, caption, UploadKind::Clip).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MediaType;

    fn media(id: &str) -> MediaRef {
        MediaRef {
            id: id.to_string(),
            media_type: MediaType::Video,
            like_count: 2000,
            comment_count: 10,
            caption_text: None,
            username: "mock".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_toggles_session() {
        let platform = MockPlatform::new();
        assert!(!platform.is_authenticated().await);
        platform.login().await.unwrap();
        assert!(platform.is_authenticated().await);
        assert_eq!(platform.login_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_search_results() {
        let platform = MockPlatform::new();
        platform.set_search_results("cats", vec![media("1")]).await;
        platform.set_default_search(vec![media("2")]).await;

        let results = platform.search_by_tag("cats", 15).await.unwrap();
        assert_eq!(results[0].id, "1");

        let results = platform.search_by_tag("anything", 15).await.unwrap();
        assert_eq!(results[0].id, "2");
    }

    #[tokio::test]
    async fn test_scripted_search_failure() {
        let platform = MockPlatform::new();
        platform.fail_searches(MockFailure::RateLimited).await;

        let err = platform.search_by_tag("cats", 15).await.unwrap_err();
        assert!(err.is_rate_limit());
    }

    #[tokio::test]
    async fn test_download_writes_payload() {
        let temp = tempfile::TempDir::new().unwrap();
        let dest = temp.path().join("out.mp4");

        let platform = MockPlatform::new();
        platform.download(&media("9"), &dest).await.unwrap();

        assert!(dest.exists());
        assert_eq!(platform.downloaded_ids().await, vec!["9"]);
    }
}
