use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig, SelectorConfig};
use crate::ConfigError;
use scraper::Selector;

/// Upper bound for the worker pool size
const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_selector_config(&config.selectors)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.download_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "download-timeout-secs must be >= 1, got {}",
            config.download_timeout_secs
        )));
    }

    Ok(())
}

/// Validates that every selector parses and the content chain is usable
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    if config.content.is_empty() {
        return Err(ConfigError::Validation(
            "selectors.content must contain at least one selector".to_string(),
        ));
    }

    let chains = [
        &config.title,
        &config.content,
        &config.lead_paragraph,
        &config.metadata,
        &config.attachment,
    ];

    for selector in chains.into_iter().flatten() {
        validate_selector(selector)?;
    }
    validate_selector(&config.attachment_link)?;

    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
