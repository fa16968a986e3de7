use std::sync::Arc;

use pounce_core::{Config, JournalStore, RoutineRunner, SanitizedConfig};
use prometheus::Registry;

/// Shared application state
pub struct AppState {
    config: Config,
    runner: Arc<RoutineRunner>,
    journal_store: Arc<dyn JournalStore>,
    registry: Registry,
}

impl AppState {
    pub fn new(
        config: Config,
        runner: Arc<RoutineRunner>,
        journal_store: Arc<dyn JournalStore>,
        registry: Registry,
    ) -> Self {
        Self {
            config,
            runner,
            journal_store,
            registry,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn runner(&self) -> &RoutineRunner {
        self.runner.as_ref()
    }

    pub fn journal_store(&self) -> &dyn JournalStore {
        self.journal_store.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
