pub mod caption;
pub mod config;
pub mod fetcher;
pub mod journal;
pub mod metrics;
pub mod platform;
pub mod publisher;
pub mod retry;
pub mod routine;
pub mod testing;
pub mod tracker;

pub use caption::{CaptionGenerator, GeminiClient, LlmClient, LlmError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ContentConfig,
    LlmConfig, LlmProvider, PlatformConfig, SanitizedConfig, ServerConfig,
};
pub use fetcher::{Fetcher, FetcherConfig};
pub use journal::{
    create_journal, JournalEvent, JournalHandle, JournalRecord, JournalStore, JournalWriter,
    MemoryJournalStore,
};
pub use metrics::register_metrics;
pub use platform::{GatewayClient, MediaPlatform, MediaRef, MediaType, PlatformError};
pub use publisher::Publisher;
pub use routine::{RoutineConfig, RoutineError, RoutineReport, RoutineRunner, RoutineStatus};
pub use tracker::{
    ContentTracker, DownloadMetadata, JsonContentTracker, MediaKind, PostedRecord, TrackerError,
};
