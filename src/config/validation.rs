use crate::config::types::{Config, CrawlerConfig, PipelineConfig, StorageConfig, TargetConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target(&config.target)?;
    validate_crawler_config(&config.crawler)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_target(target: &TargetConfig) -> Result<(), ConfigError> {
    if target.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "target name cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&target.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "target url must be http or https, got '{}'",
            target.url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "target url has no host: '{}'",
            target.url
        )));
    }

    if target.team_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "team_id cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agents.iter().all(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "at least one non-empty user agent is required".to_string(),
        ));
    }

    if let Some(word) = config.skip_words.iter().find(|w| w.trim().is_empty()) {
        return Err(ConfigError::InvalidPattern(format!(
            "skip word cannot be blank: '{}'",
            word
        )));
    }

    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and 100, got {}",
            config.max_concurrency
        )));
    }

    if config.chunk_overlap >= config.chunk_size {
        return Err(ConfigError::Validation(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            config.chunk_overlap, config.chunk_size
        )));
    }

    if config.boundary_window >= config.chunk_size - config.chunk_overlap {
        return Err(ConfigError::Validation(format!(
            "boundary_window ({}) must be smaller than chunk_size - chunk_overlap ({})",
            config.boundary_window,
            config.chunk_size - config.chunk_overlap
        )));
    }

    if config.max_content_length < 1 {
        return Err(ConfigError::Validation(
            "max_content_length must be >= 1".to_string(),
        ));
    }

    if config.batch_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "batch_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.url_directory.is_empty() {
        return Err(ConfigError::Validation(
            "url_directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
