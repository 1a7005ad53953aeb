use crate::config::types::{Config, ExtractorConfig, RunnerConfig, TableConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_runner_config(&config.runner)?;
    validate_table_config(&config.table)?;
    validate_extractor_config(&config.extractor)?;
    Ok(())
}

/// Validates batch execution settings
fn validate_runner_config(config: &RunnerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.flush_every < 1 {
        return Err(ConfigError::Validation(format!(
            "flush_every must be >= 1, got {}",
            config.flush_every
        )));
    }

    if config.flush_interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "flush_interval_secs must be >= 1, got {}",
            config.flush_interval_secs
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    Ok(())
}

/// Validates table artifact settings
fn validate_table_config(config: &TableConfig) -> Result<(), ConfigError> {
    if config.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "table path cannot be empty".to_string(),
        ));
    }

    if config.url_column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "url_column cannot be empty".to_string(),
        ));
    }

    if config.manifest_column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "manifest_column cannot be empty".to_string(),
        ));
    }

    if config.url_column == config.manifest_column {
        return Err(ConfigError::Validation(format!(
            "url_column and manifest_column must differ, both are '{}'",
            config.url_column
        )));
    }

    // An empty suffix would make the checkpoint overwrite the table itself
    if config.checkpoint_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_suffix cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP extractor settings
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}
