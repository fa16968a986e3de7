//! API endpoint integration tests against the in-process router.

mod common;

use axum::http::StatusCode;
use common::TestFixture;
use pounce_core::RoutineConfig;

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_home_lists_endpoints() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["service"], "pounce");
    assert!(response.body["endpoints"]["/api/v1/run"].is_string());
}

#[tokio::test]
async fn test_status_reports_initial_state() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["run_in_progress"], false);
    assert_eq!(response.body["dry_run"], true);
    assert_eq!(response.body["posted_images"], 0);
    assert_eq!(response.body["posted_videos"], 0);
    assert_eq!(response.body["downloads_available"], 0);
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["platform"]["password_configured"], true);

    let raw = response.body.to_string();
    assert!(!raw.contains("not-a-real-password"));
}

#[tokio::test]
async fn test_journal_starts_empty() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/journal").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, serde_json::json!([]));
}

#[tokio::test]
async fn test_metrics_exposition() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    // Exposition format is plain text, surfaced as a JSON string by the fixture
    let text = response.body.as_str().unwrap_or_default().to_string();
    assert!(text.contains("pounce_"), "unexpected exposition: {}", text);
}

#[tokio::test(start_paused = true)]
async fn test_run_endpoint_executes_a_pass() {
    let fixture = TestFixture::new().await;
    fixture.add_user_file("cat.jpg");

    let response = fixture.post("/api/v1/run").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "success");
    assert_eq!(response.body["posted"], 1);
    assert_eq!(response.body["quota"], 1);
    assert_eq!(response.body["execution_mode"], "dry_run");

    // Journal picked up the pass (give the writer task a beat)
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let journal = fixture.get("/api/v1/journal?limit=10").await;
    let events: Vec<String> = journal
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["event_type"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(events.contains(&"run_started".to_string()));
    assert!(events.contains(&"run_completed".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_run_endpoint_with_no_content_posts_nothing() {
    let fixture = TestFixture::with_routine(RoutineConfig {
        dry_run: false,
        target_posts: 1,
        ..RoutineConfig::default()
    })
    .await;

    let response = fixture.post("/api/v1/run").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "success");
    assert_eq!(response.body["posted"], 0);
    assert_eq!(response.body["execution_mode"], "live");

    assert!(fixture.platform.uploads().await.is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
