use crate::config::types::{
    Config, CrawlerConfig, ExtractorConfig, OutputConfig, PublishConfig, RendererConfig,
    RendererKind, RetryConfig, UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound on concurrent fetch workers
pub const MAX_WORKERS: u32 = 4;

/// Upper bound on the retry backoff multiplier
pub const MAX_RETRY_MULTIPLIER: f64 = 10.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_renderer_config(&config.renderer)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extractor_config(&config.extractor)?;
    validate_output_config(&config.output)?;
    validate_publish_config(&config.publish)?;
    Ok(())
}

/// Validates crawler configuration
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.api_version.trim_matches('/').is_empty() {
        return Err(ConfigError::Validation(
            "api_version cannot be empty".to_string(),
        ));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.fetch_timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout must be >= 1000ms, got {}ms",
            config.fetch_timeout
        )));
    }

    for start in config.effective_start_urls() {
        validate_http_url(&start, "start URL")?;
    }

    if let Some(sitemap) = &config.sitemap_url {
        validate_http_url(sitemap, "sitemap_url")?;
    }

    if !config.effective_version_filter().starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "version_filter must start with '/', got '{}'",
            config.effective_version_filter()
        )));
    }

    let unknown = config.language_filter.unknown_languages();
    if !unknown.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Unknown languages in language_filter: {}",
            unknown.join(", ")
        )));
    }

    validate_retry_config(&config.retry)?;

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry.max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !(1.0..=MAX_RETRY_MULTIPLIER).contains(&config.multiplier) {
        return Err(ConfigError::Validation(format!(
            "retry.multiplier must be between 1.0 and {}, got {}",
            MAX_RETRY_MULTIPLIER,
            config.multiplier
        )));
    }

    Ok(())
}

fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.kind == RendererKind::Browserless {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ConfigError::Validation("renderer.endpoint is required for browserless".to_string())
        })?;
        validate_http_url(endpoint, "renderer.endpoint")?;
    }

    if let Some(selector) = &config.wait_for_selector {
        validate_selector(selector, "renderer.wait_for_selector")?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    for selector in &config.content_selectors {
        validate_selector(selector, "extractor.content_selectors")?;
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config
        .artifact_prefix
        .chars()
        .any(|c| c == '/' || c == '\\')
    {
        return Err(ConfigError::Validation(format!(
            "artifact_prefix cannot contain path separators, got '{}'",
            config.artifact_prefix
        )));
    }

    Ok(())
}

fn validate_publish_config(config: &PublishConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    match config.store_root.as_deref() {
        Some(root) if !root.is_empty() => {}
        _ => {
            return Err(ConfigError::Validation(
                "publish.store_root is required when publishing is enabled".to_string(),
            ))
        }
    }

    if config.target.is_empty() || config.archive.is_empty() {
        return Err(ConfigError::Validation(
            "publish target and archive locations cannot be empty".to_string(),
        ));
    }

    if config.target == config.archive {
        return Err(ConfigError::Validation(format!(
            "publish target and archive must differ, both are '{}'",
            config.target
        )));
    }

    Ok(())
}

fn validate_http_url(value: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            what, value
        )));
    }

    Ok(())
}

fn validate_selector(selector: &str, what: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!("Invalid CSS selector in {} '{}': {:?}", what, selector, e))
    })?;
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
