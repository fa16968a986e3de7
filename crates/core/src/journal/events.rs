use serde::{Deserialize, Serialize};

/// Events recorded in the run journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalEvent {
    /// Service process started.
    ServiceStarted { version: String, config_hash: String },
    /// Service process stopped.
    ServiceStopped { reason: String },
    /// A posting pass began.
    RunStarted {
        run_id: String,
        quota: u32,
        dry_run: bool,
    },
    /// A posting pass finished.
    RunCompleted {
        run_id: String,
        posted: u32,
        duration_ms: u64,
    },
    /// A posting pass was rejected because one was already active.
    RunSkipped { reason: String },
    /// A piece of content was published (or would have been, in dry-run).
    ContentPosted {
        file: String,
        kind: String,
        source: String,
    },
    /// An upload failed.
    PostFailed { file: String, reason: String },
    /// One outer fetch attempt finished.
    FetchAttempt {
        attempt: u32,
        max_attempts: u32,
        downloaded: usize,
    },
    /// A media file was downloaded and validated.
    MediaDownloaded {
        media_id: String,
        file: String,
        size_bytes: u64,
        attempts: u32,
    },
    /// A download candidate was abandoned.
    DownloadFailed { media_id: String, reason: String },
    /// A rate-limit cooldown was applied.
    RateLimitBackoff {
        topic: String,
        attempt: u32,
        delay_secs: u64,
    },
    /// A local file could not be removed after posting.
    CleanupFailed { file: String, reason: String },
    /// An age-based sweep of the download directory finished.
    SweepCompleted { removed: usize },
}

impl JournalEvent {
    /// Snake-case discriminant used for filtering and display.
    pub fn event_type(&self) -> &'static str {
        match self {
            JournalEvent::ServiceStarted { .. } => "service_started",
            JournalEvent::ServiceStopped { .. } => "service_stopped",
            JournalEvent::RunStarted { .. } => "run_started",
            JournalEvent::RunCompleted { .. } => "run_completed",
            JournalEvent::RunSkipped { .. } => "run_skipped",
            JournalEvent::ContentPosted { .. } => "content_posted",
            JournalEvent::PostFailed { .. } => "post_failed",
            JournalEvent::FetchAttempt { .. } => "fetch_attempt",
            JournalEvent::MediaDownloaded { .. } => "media_downloaded",
            JournalEvent::DownloadFailed { .. } => "download_failed",
            JournalEvent::RateLimitBackoff { .. } => "rate_limit_backoff",
            JournalEvent::CleanupFailed { .. } => "cleanup_failed",
            JournalEvent::SweepCompleted { .. } => "sweep_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let event = JournalEvent::RunStarted {
            run_id: "r-1".to_string(),
            quota: 2,
            dry_run: true,
        };
        assert_eq!(event.event_type(), "run_started");

        let event = JournalEvent::SweepCompleted { removed: 3 };
        assert_eq!(event.event_type(), "sweep_completed");
    }

    #[test]
    fn test_event_serialization_tagged() {
        let event = JournalEvent::ContentPosted {
            file: "reel_123.mp4".to_string(),
            kind: "videos".to_string(),
            source: "routine".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"content_posted\""));

        let parsed: JournalEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, JournalEvent::ContentPosted { .. }));
    }
}
