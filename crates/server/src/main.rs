use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pounce_core::{
    create_journal, load_config, register_metrics, validate_config, CaptionGenerator,
    ContentTracker, Fetcher, GatewayClient, GeminiClient, JournalEvent, JournalStore,
    JsonContentTracker, LlmClient, LlmProvider, MediaPlatform, MemoryJournalStore, Publisher,
    RoutineRunner,
};

use pounce_server::api::create_router;
use pounce_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the journal event channel
const JOURNAL_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("POUNCE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Gateway URL: {}", config.platform.url);
    info!("Dry-run mode: {}", config.routine.dry_run);

    // Compute config hash for the journal
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Content directories must exist before the first pass
    std::fs::create_dir_all(&config.content.user_dir)
        .with_context(|| format!("Failed to create {:?}", config.content.user_dir))?;
    std::fs::create_dir_all(&config.content.downloads_dir)
        .with_context(|| format!("Failed to create {:?}", config.content.downloads_dir))?;

    // Journal system
    let journal_store = Arc::new(MemoryJournalStore::with_default_capacity());
    let (journal_handle, journal_writer) = create_journal(
        Arc::clone(&journal_store) as Arc<dyn JournalStore>,
        JOURNAL_BUFFER_SIZE,
    );
    let writer_handle = tokio::spawn(journal_writer.run());

    journal_handle
        .emit(JournalEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;

    // Metrics registry
    let registry = prometheus::Registry::new();
    register_metrics(&registry).context("Failed to register metrics")?;

    // Platform client
    let platform: Arc<dyn MediaPlatform> = Arc::new(GatewayClient::new(config.platform.clone()));
    info!("Platform gateway client initialized");

    // Caption model, if configured
    let llm: Option<Arc<dyn LlmClient>> = match &config.llm {
        Some(llm_config) => match llm_config.provider {
            LlmProvider::Gemini => {
                let api_key = llm_config
                    .api_key
                    .clone()
                    .context("llm.api_key missing after validation")?;
                let mut client = GeminiClient::new(api_key, llm_config.model.clone());
                if let Some(ref api_base) = llm_config.api_base {
                    client = client.with_api_base(api_base.clone());
                }
                info!("Caption model enabled: gemini ({})", llm_config.model);
                Some(Arc::new(client))
            }
        },
        None => {
            info!("No caption model configured, using static fallbacks");
            None
        }
    };

    // Content tracker
    let tracker: Arc<dyn ContentTracker> = Arc::new(JsonContentTracker::new(
        &config.content.posted_path,
        &config.content.ledger_path,
        &config.content.downloads_dir,
    ));
    info!("Content tracker initialized");

    // Routine components
    let fetcher = Fetcher::new(
        Arc::clone(&platform),
        Arc::clone(&tracker),
        config.fetcher.clone(),
        &config.content.downloads_dir,
    )
    .with_journal(journal_handle.clone());

    let captions = CaptionGenerator::new(llm);

    let publisher = Publisher::new(
        Arc::clone(&platform),
        Arc::clone(&tracker),
        config.routine.dry_run,
    )
    .with_journal(journal_handle.clone());

    let runner = Arc::new(
        RoutineRunner::new(
            config.routine.clone(),
            config.content.clone(),
            Arc::clone(&platform),
            Arc::clone(&tracker),
            fetcher,
            captions,
            publisher,
        )
        .with_journal(journal_handle.clone()),
    );
    info!("Routine runner initialized");

    // Create app state and router
    let state = Arc::new(AppState::new(
        config.clone(),
        runner,
        Arc::clone(&journal_store) as Arc<dyn JournalStore>,
        registry,
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    journal_handle
        .emit(JournalEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // Drop the last handle so the writer's channel closes, then wait for it
    // to drain. Component handles were moved into AppState, already dropped.
    drop(journal_handle);
    let _ = writer_handle.await;
    info!("Journal writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
