use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
}

/// A single media item returned from a hashtag search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    /// Platform media identifier.
    pub id: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub caption_text: Option<String>,
    /// Uploader account name.
    pub username: String,
}

impl MediaRef {
    /// Engagement score used to rank download candidates.
    pub fn engagement_score(&self) -> u64 {
        self.like_count + 10 * self.comment_count
    }
}

/// Errors from platform operations.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Platform connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Platform API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlatformError {
    /// Whether this error indicates throttling. Besides the dedicated
    /// variant, API messages are matched by substring since the gateway
    /// passes upstream error text through verbatim.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            PlatformError::RateLimited(_) => true,
            PlatformError::Api { status, message } => {
                *status == 429
                    || message.to_lowercase().contains("rate limit")
                    || message.to_lowercase().contains("too many requests")
            }
            _ => false,
        }
    }

    /// Whether this error indicates a broken or missing session.
    pub fn is_auth(&self) -> bool {
        match self {
            PlatformError::AuthenticationFailed(_) => true,
            PlatformError::Api { status, message } => {
                matches!(status, 401 | 403)
                    || message.to_lowercase().contains("login")
                    || message.to_lowercase().contains("authentication")
            }
            _ => false,
        }
    }
}

/// Classify an HTTP error response from the gateway.
pub(crate) fn classify_api_error(status: u16, message: String) -> PlatformError {
    match status {
        429 => PlatformError::RateLimited(message),
        401 | 403 => PlatformError::AuthenticationFailed(message),
        404 => PlatformError::NotFound(message),
        _ => PlatformError::Api { status, message },
    }
}

/// Trait for the media platform client.
#[async_trait]
pub trait MediaPlatform: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Open a fresh session with the configured credentials.
    async fn login(&self) -> Result<(), PlatformError>;

    /// Whether a session is currently active.
    async fn is_authenticated(&self) -> bool;

    /// Fetch recent top media tagged with `tag`.
    async fn search_by_tag(&self, tag: &str, limit: u32) -> Result<Vec<MediaRef>, PlatformError>;

    /// Download a media item's file to `dest`.
    async fn download(&self, media: &MediaRef, dest: &Path) -> Result<(), PlatformError>;

    /// Upload an image post.
    async fn upload_photo(&self, path: &Path, caption: &str) -> Result<(), PlatformError>;

    /// Upload a regular video post.
    async fn upload_video(&self, path: &Path, caption: &str) -> Result<(), PlatformError>;

    /// Upload a short-form clip.
    async fn upload_clip(&self, path: &Path, caption: &str) -> Result<(), PlatformError>;
}
