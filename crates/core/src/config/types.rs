use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::fetcher::FetcherConfig;
use crate::routine::RoutineConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub platform: PlatformConfig,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub routine: RoutineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Media platform gateway configuration.
///
/// The gateway is a self-hosted REST bridge in front of the platform's
/// private API; all posting and hashtag search goes through it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    /// Gateway base URL (e.g. "http://localhost:8000")
    pub url: String,
    /// Platform account username
    pub username: String,
    /// Platform account password
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Login request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub login_timeout_secs: u32,
    /// Upload request timeout in seconds (default: 120)
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

fn default_upload_timeout() -> u32 {
    120
}

/// Caption model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Which provider to use
    #[serde(default)]
    pub provider: LlmProvider,
    /// API key (required for gemini)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name (e.g. "gemini-1.5-flash")
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Override the API base URL (useful for testing)
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    Gemini,
}

fn default_llm_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Content directory layout and tracking document paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    /// Directory scanned for user-dropped files (highest posting priority)
    #[serde(default = "default_user_dir")]
    pub user_dir: PathBuf,
    /// Directory downloaded media is stored in
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
    /// Posted-content document path
    #[serde(default = "default_posted_path")]
    pub posted_path: PathBuf,
    /// Downloaded-content ledger document path
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            user_dir: default_user_dir(),
            downloads_dir: default_downloads_dir(),
            posted_path: default_posted_path(),
            ledger_path: default_ledger_path(),
        }
    }
}

fn default_user_dir() -> PathBuf {
    PathBuf::from("user_content")
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("downloads/videos")
}

fn default_posted_path() -> PathBuf {
    PathBuf::from("posted_content.json")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("downloaded_content.json")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub platform: SanitizedPlatformConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<SanitizedLlmConfig>,
    pub content: ContentConfig,
    pub routine: RoutineConfig,
}

/// Sanitized platform config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlatformConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

/// Sanitized LLM config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            platform: SanitizedPlatformConfig {
                url: config.platform.url.clone(),
                username: config.platform.username.clone(),
                password_configured: !config.platform.password.is_empty(),
                timeout_secs: config.platform.timeout_secs,
            },
            llm: config.llm.as_ref().map(|l| SanitizedLlmConfig {
                provider: match l.provider {
                    LlmProvider::Gemini => "gemini".to_string(),
                },
                model: l.model.clone(),
                api_key_configured: l.api_key.as_deref().is_some_and(|k| !k.is_empty()),
            }),
            content: config.content.clone(),
            routine: config.routine.clone(),
        }
    }
}
