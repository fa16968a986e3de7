//! HTTP client for the platform gateway sidecar.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::PlatformConfig;

use super::types::{classify_api_error, MediaPlatform, MediaRef, MediaType, PlatformError};

/// Client for a self-hosted gateway exposing the platform's private API
/// over plain REST endpoints.
pub struct GatewayClient {
    client: Client,
    config: PlatformConfig,
    /// Whether a session is believed active (cookie jar holds the actual
    /// session; this flag avoids a login round-trip per call).
    session: Arc<RwLock<bool>>,
}

impl GatewayClient {
    pub fn new(config: PlatformConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            session: Arc::new(RwLock::new(false)),
        }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), PlatformError> {
        if *self.session.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Make an authenticated GET request, re-authenticating once on a
    /// session rejection.
    async fn get_with_reauth(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, PlatformError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status().as_u16();
        if matches!(status, 401 | 403) {
            warn!("Gateway session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = false;
            }
            self.login().await?;

            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(map_send_error)?;
            return error_for_status(response).await;
        }

        error_for_status(response).await
    }

    /// Build the multipart form for an upload.
    async fn upload_form(path: &Path, caption: &str) -> Result<multipart::Form, PlatformError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("caption", caption.to_string()))
    }

    /// POST an upload to the given endpoint with the longer upload timeout.
    async fn post_upload(
        &self,
        endpoint: &str,
        path: &Path,
        caption: &str,
    ) -> Result<(), PlatformError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let form = Self::upload_form(path, caption).await?;

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.upload_timeout_secs as u64))
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        error_for_status(response).await?;
        debug!("Upload to {} accepted", endpoint);
        Ok(())
    }
}

/// Media item as returned by the gateway (mirrors the platform's own shape).
#[derive(Debug, Deserialize)]
struct GatewayMedia {
    pk: serde_json::Value,
    media_type: u8,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    comment_count: u64,
    #[serde(default)]
    caption_text: Option<String>,
    user: GatewayUser,
}

#[derive(Debug, Deserialize)]
struct GatewayUser {
    username: String,
}

impl GatewayMedia {
    fn into_media_ref(self) -> MediaRef {
        let id = match self.pk {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        MediaRef {
            id,
            media_type: if self.media_type == 2 {
                MediaType::Video
            } else {
                MediaType::Image
            },
            like_count: self.like_count,
            comment_count: self.comment_count,
            caption_text: self.caption_text,
            username: self.user.username,
        }
    }
}

#[async_trait]
impl MediaPlatform for GatewayClient {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn login(&self) -> Result<(), PlatformError> {
        let url = format!("{}/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.login_timeout_secs as u64))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlatformError::Timeout
                } else if e.is_connect() {
                    PlatformError::ConnectionFailed(e.to_string())
                } else {
                    PlatformError::AuthenticationFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::AuthenticationFailed(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(100).collect::<String>()
            )));
        }

        debug!("Gateway login successful");
        let mut session = self.session.write().await;
        *session = true;
        Ok(())
    }

    async fn is_authenticated(&self) -> bool {
        *self.session.read().await
    }

    async fn search_by_tag(&self, tag: &str, limit: u32) -> Result<Vec<MediaRef>, PlatformError> {
        let response = self
            .get_with_reauth(
                "/hashtag/top",
                &[("name", tag.to_string()), ("amount", limit.to_string())],
            )
            .await?;

        let items: Vec<GatewayMedia> = response
            .json()
            .await
            .map_err(|e| PlatformError::Api {
                status: 200,
                message: format!("Malformed search response: {}", e),
            })?;

        Ok(items.into_iter().map(GatewayMedia::into_media_ref).collect())
    }

    async fn download(&self, media: &MediaRef, dest: &Path) -> Result<(), PlatformError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .get_with_reauth("/media/download", &[("media_id", media.id.clone())])
            .await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    PlatformError::Timeout
                } else {
                    PlatformError::ConnectionFailed(e.to_string())
                }
            })?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("Downloaded media {} to {}", media.id, dest.display());
        Ok(())
    }

    async fn upload_photo(&self, path: &Path, caption: &str) -> Result<(), PlatformError> {
        self.post_upload("/photo/upload", path, caption).await
    }

    async fn upload_video(&self, path: &Path, caption: &str) -> Result<(), PlatformError> {
        self.post_upload("/video/upload", path, caption).await
    }

    async fn upload_clip(&self, path: &Path, caption: &str) -> Result<(), PlatformError> {
        self.post_upload("/clip/upload", path, caption).await
    }
}

fn map_send_error(e: reqwest::Error) -> PlatformError {
    if e.is_timeout() {
        PlatformError::Timeout
    } else if e.is_connect() {
        PlatformError::ConnectionFailed(e.to_string())
    } else {
        PlatformError::Api {
            status: 0,
            message: e.to_string(),
        }
    }
}

/// Turn a non-success response into a classified error.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(classify_api_error(status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> PlatformConfig {
        PlatformConfig {
            url: url.to_string(),
            username: "poster".to_string(),
            password: "hunter2".to_string(),
            timeout_secs: 30,
            login_timeout_secs: 30,
            upload_timeout_secs: 120,
        }
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let client = GatewayClient::new(config("http://localhost:8000/"));
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_client_starts_unauthenticated() {
        let client = GatewayClient::new(config("http://localhost:8000"));
        assert!(!client.is_authenticated().await);
    }

    #[test]
    fn test_gateway_media_mapping_numeric_pk() {
        let json = r#"{
            "pk": 3141592653589,
            "media_type": 2,
            "like_count": 1200,
            "comment_count": 30,
            "caption_text": "so cute #cat",
            "user": {"username": "catlady"}
        }"#;
        let wire: GatewayMedia = serde_json::from_str(json).unwrap();
        let media = wire.into_media_ref();

        assert_eq!(media.id, "3141592653589");
        assert_eq!(media.media_type, MediaType::Video);
        assert_eq!(media.like_count, 1200);
        assert_eq!(media.username, "catlady");
    }

    #[test]
    fn test_gateway_media_mapping_image_type() {
        let json = r#"{"pk": "abc", "media_type": 1, "user": {"username": "u"}}"#;
        let wire: GatewayMedia = serde_json::from_str(json).unwrap();
        let media = wire.into_media_ref();

        assert_eq!(media.id, "abc");
        assert_eq!(media.media_type, MediaType::Image);
        assert_eq!(media.like_count, 0);
    }
}
