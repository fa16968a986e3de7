//! Caption generator: prompts the LLM and falls back to static captions.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{info, warn};

use crate::tracker::{DownloadMetadata, MediaKind};

use super::llm::{CompletionRequest, LlmClient, LlmError};

/// Hashtag block appended when the model forgets to include any.
const DEFAULT_VIDEO_TAGS: &str = "\n\n#catsofinstagram #cutecat #funnycats #reels #viral";

/// How much of the source caption is fed back into the prompt.
const SEED_CAPTION_MAX_CHARS: usize = 200;

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").unwrap());

static IMAGE_FALLBACKS: &[&str] = &[
    "😻 Adorable cat moment! 🐾\n\n#catsofinstagram #cute #kitty #meow #catlife #feline #pets",
    "🐱 This little furball has my heart! ❤️\n\n#cats #cute #kitty #catlovers #feline #pets #adorable",
    "😸 Purrfection captured! 📸\n\n#catsofinstagram #cats #kitty #cute #catlife #feline #meow",
];

static VIDEO_FALLBACKS: &[&str] = &[
    "🎬 This cat is pure entertainment! 😹\n\n#catsofinstagram #funnycats #reels #viral #cutecats",
    "😻 Can't stop watching this! 🔄\n\n#catreel #funnypets #catsofinstagram #viral #cute",
    "🐱 When cats are this adorable... 💕\n\n#cutecats #catsofinstagram #reels #adorable #pets",
    "😸 This made my day! 🌟\n\n#happycats #funnycats #catsofinstagram #viral #joy",
    "🎥 Cat content that hits different! ✨\n\n#catvideo #funnypets #catsofinstagram #trending",
];

/// Extract lowercase hashtags (without the `#`) from a caption.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str()[1..].to_string())
        .collect()
}

/// Generates captions for outgoing posts.
///
/// With no LLM configured every call lands on the static fallback lists.
pub struct CaptionGenerator {
    llm: Option<Arc<dyn LlmClient>>,
}

impl CaptionGenerator {
    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { llm }
    }

    /// Caption a local file, using its metadata sidecar when present.
    pub async fn generate_for(&self, path: &Path) -> String {
        match MediaKind::from_path(path) {
            MediaKind::Videos => {
                let metadata = DownloadMetadata::load_for(path);
                self.generate_video_caption(metadata.as_ref()).await
            }
            MediaKind::Images => self.generate_image_caption().await,
        }
    }

    /// Caption for an image post.
    pub async fn generate_image_caption(&self) -> String {
        let prompt = "Create a cute and engaging caption for a cat photo. \
            Include relevant hashtags like #catsofinstagram #cute #kitty #meow";

        match self.complete(prompt).await {
            Ok(caption) => caption,
            Err(e) => {
                warn!("Caption generation failed: {}", e);
                fallback_image_caption()
            }
        }
    }

    /// Caption for a video post, optionally seeded with the source caption.
    pub async fn generate_video_caption(&self, metadata: Option<&DownloadMetadata>) -> String {
        let seed = metadata
            .and_then(|m| m.original_caption.as_deref())
            .filter(|c| !c.is_empty())
            .map(|c| c.chars().take(SEED_CAPTION_MAX_CHARS).collect::<String>());

        let prompt = match seed {
            Some(ref original) => format!(
                "Create a fresh, engaging short-form video caption inspired by this \
                 popular cat content: \"{}\"\n\n\
                 Requirements:\n\
                 - Make it original and unique (don't copy)\n\
                 - Focus on cat behavior, cuteness, or humor\n\
                 - Include 5-8 relevant hashtags\n\
                 - Keep it under 150 characters\n\
                 - Make it shareable and engaging",
                original
            ),
            None => "Create a short-form video caption for a cute cat video.\n\n\
                 Requirements:\n\
                 - Focus on cat cuteness, funny behavior, or relatable moments\n\
                 - Include trending cat hashtags\n\
                 - Keep it short and punchy\n\
                 - Make it shareable and engaging\n\
                 - Under 150 characters"
                .to_string(),
        };

        match self.complete(&prompt).await {
            Ok(caption) => {
                // The model occasionally drops the hashtags entirely
                if caption.contains('#') {
                    caption
                } else {
                    format!("{}{}", caption, DEFAULT_VIDEO_TAGS)
                }
            }
            Err(e) => {
                warn!("Video caption generation failed: {}", e);
                fallback_video_caption()
            }
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let Some(ref llm) = self.llm else {
            return Err(LlmError::NotConfigured);
        };

        let response = llm.complete(CompletionRequest::new(prompt)).await?;
        info!("Generated caption with {}/{}", llm.provider(), llm.model());
        Ok(response.text.trim().to_string())
    }
}

fn fallback_image_caption() -> String {
    IMAGE_FALLBACKS[fastrand::usize(..IMAGE_FALLBACKS.len())].to_string()
}

fn fallback_video_caption() -> String {
    VIDEO_FALLBACKS[fastrand::usize(..VIDEO_FALLBACKS.len())].to_string()
}
