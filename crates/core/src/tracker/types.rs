use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extensions treated as video content.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// File extensions treated as image content.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Errors from tracker persistence.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The two media kinds tracked in the posted log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Images,
    Videos,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Images => "images",
            MediaKind::Videos => "videos",
        }
    }

    /// Classify a file by extension. Anything that is not a known video
    /// extension counts as an image, matching the upload dispatch.
    pub fn from_path(path: &Path) -> Self {
        if has_extension(path, VIDEO_EXTENSIONS) {
            MediaKind::Videos
        } else {
            MediaKind::Images
        }
    }
}

/// Case-insensitive extension membership test.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|v| e.eq_ignore_ascii_case(v)))
}

/// One publish action, as recorded in the posted log.
///
/// `posted_at` is kept as the raw string from disk: records with timestamps
/// we cannot parse must still load, and are treated as recent when filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedRecord {
    pub file: String,
    pub caption: String,
    pub posted_at: String,
    pub source: String,
}

impl PostedRecord {
    /// Parse the posting timestamp, if possible.
    pub fn posted_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.posted_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// The posted-content document: two append-only sequences keyed by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostedLog {
    #[serde(default)]
    pub images: Vec<PostedRecord>,
    #[serde(default)]
    pub videos: Vec<PostedRecord>,
}

/// The download ledger document: recently downloaded media ids plus the
/// last sweep timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadLedger {
    #[serde(default)]
    pub media_ids: Vec<String>,
    #[serde(default)]
    pub last_cleanup: Option<DateTime<Utc>>,
}

/// Sidecar metadata written next to each downloaded media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadMetadata {
    pub media_id: String,
    #[serde(default)]
    pub original_caption: Option<String>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub username: String,
    pub downloaded_at: DateTime<Utc>,
    pub file_size_bytes: u64,
    pub download_attempts: u32,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub validated: bool,
}

impl DownloadMetadata {
    /// Path of the sidecar document for a media file.
    pub fn sidecar_path(media_path: &Path) -> PathBuf {
        media_path.with_extension("json")
    }

    /// Load the sidecar for a media file, if one exists and parses.
    pub fn load_for(media_path: &Path) -> Option<Self> {
        let path = Self::sidecar_path(media_path);
        let text = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("Unreadable sidecar {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write the sidecar next to the media file.
    pub fn write_for(&self, media_path: &Path) -> Result<(), TrackerError> {
        let path = Self::sidecar_path(media_path);
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, text)?;
        Ok(())
    }
}

/// Trait for the content tracking store.
///
/// Implementations serialize every read-modify-write internally; callers do
/// not need to coordinate access.
pub trait ContentTracker: Send + Sync {
    /// Layered duplicate check. A hit anywhere back-fills the ledger so the
    /// next check for the same id stays on the fast path. I/O errors log and
    /// report "not downloaded" rather than blocking a fetch.
    fn is_already_downloaded(&self, media_id: &str) -> bool;

    /// Idempotently record a downloaded media id, evicting the oldest
    /// entries beyond the ledger cap.
    fn track_download(&self, media_id: &str) -> Result<(), TrackerError>;

    /// Append a publish record to the matching sequence.
    fn record_posted(&self, kind: MediaKind, record: PostedRecord) -> Result<(), TrackerError>;

    /// Drop candidates whose file name matches a video posted within the
    /// recency window. Records with unparsable timestamps count as recent.
    fn filter_unposted(&self, candidates: &[PathBuf]) -> Vec<PathBuf>;

    /// Stamp the ledger with the time of an age-based sweep.
    fn record_cleanup(&self) -> Result<(), TrackerError>;

    /// (images, videos) counts from the posted log.
    fn posted_counts(&self) -> (usize, usize);

    /// Number of ids currently in the ledger.
    fn ledger_len(&self) -> usize;
}
