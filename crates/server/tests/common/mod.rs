//! Common test utilities for in-process API testing with mocks.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pounce_core::{
    create_journal, register_metrics, testing::MockPlatform, CaptionGenerator, Config,
    ContentConfig, ContentTracker, Fetcher, FetcherConfig, JournalStore, JsonContentTracker,
    MediaPlatform, MemoryJournalStore, PlatformConfig, Publisher, RoutineConfig, RoutineRunner,
    ServerConfig,
};
use pounce_server::{api::create_router, state::AppState};

/// In-process server fixture with a mocked platform and no LLM.
pub struct TestFixture {
    pub router: Router,
    pub platform: Arc<MockPlatform>,
    pub content: ContentConfig,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_routine(RoutineConfig::default()).await
    }

    pub async fn with_routine(routine: RoutineConfig) -> Self {
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
        let tracker: Arc<dyn ContentTracker> = Arc::new(JsonContentTracker::new(
            &content.posted_path,
            &content.ledger_path,
            &content.downloads_dir,
        ));

        let journal_store = Arc::new(MemoryJournalStore::with_default_capacity());
        let (journal, journal_writer) = create_journal(
            Arc::clone(&journal_store) as Arc<dyn JournalStore>,
            100,
        );
        tokio::spawn(journal_writer.run());

        let fetcher_config = FetcherConfig {
            keywords: vec!["cats".to_string()],
            keywords_per_fetch: 1,
            ..FetcherConfig::default()
        };

        let fetcher = Fetcher::new(
            Arc::clone(&platform) as Arc<dyn MediaPlatform>,
            Arc::clone(&tracker),
            fetcher_config.clone(),
            &content.downloads_dir,
        )
        .with_journal(journal.clone());

        let publisher = Publisher::new(
            Arc::clone(&platform) as Arc<dyn MediaPlatform>,
            Arc::clone(&tracker),
            routine.dry_run,
        )
        .with_journal(journal.clone());

        let runner = Arc::new(
            RoutineRunner::new(
                routine.clone(),
                content.clone(),
                Arc::clone(&platform) as Arc<dyn MediaPlatform>,
                Arc::clone(&tracker),
                fetcher,
                CaptionGenerator::new(None),
                publisher,
            )
            .with_journal(journal.clone()),
        );

        let config = Config {
            platform: PlatformConfig {
                url: "http://localhost:1".to_string(),
                username: "tester".to_string(),
                password: "not-a-real-password".to_string(),
                timeout_secs: 30,
                login_timeout_secs: 30,
                upload_timeout_secs: 120,
            },
            llm: None,
            server: ServerConfig::default(),
            content: content.clone(),
            fetcher: fetcher_config,
            routine,
        };

        let registry = prometheus::Registry::new();
        register_metrics(&registry).expect("Failed to register metrics");

        let state = Arc::new(AppState::new(
            config,
            runner,
            Arc::clone(&journal_store) as Arc<dyn JournalStore>,
            registry,
        ));
        let router = create_router(state);

        Self {
            router,
            platform,
            content,
            temp_dir,
        }
    }

    /// Drop a user content file into the fixture's user directory.
    pub fn add_user_file(&self, name: &str) -> PathBuf {
        let path = self.content.user_dir.join(name);
        std::fs::write(&path, b"user content").unwrap();
        path
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}
