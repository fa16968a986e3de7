use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Platform section has non-empty url/credentials
/// - Server port is not 0
/// - Fetcher keyword list is non-empty
/// - Routine post target is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.platform.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "platform.url cannot be empty".to_string(),
        ));
    }

    if config.platform.username.is_empty() || config.platform.password.is_empty() {
        return Err(ConfigError::ValidationError(
            "platform.username and platform.password are required".to_string(),
        ));
    }

    if config.fetcher.keywords.is_empty() {
        return Err(ConfigError::ValidationError(
            "fetcher.keywords cannot be empty".to_string(),
        ));
    }

    if config.routine.target_posts == 0 {
        return Err(ConfigError::ValidationError(
            "routine.target_posts cannot be 0".to_string(),
        ));
    }

    if let Some(ref llm) = config.llm {
        if llm.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::ValidationError(
                "llm.api_key is required when the llm section is present".to_string(),
            ));
        }
    }

    Ok(())
}
