use crate::config::types::{
    ApiConfig, BatchConfig, Config, DetectionConfig, HttpConfig, OutputConfig, RateLimitConfig,
    RetryConfig, SitemapConfig,
};
use crate::ConfigError;
use regex::RegexBuilder;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_retry_config(&config.retry)?;
    validate_detection_config(&config.detection)?;
    validate_sitemap_config(&config.sitemap)?;
    validate_batch_config(&config.batch)?;
    validate_api_config(&config.api)?;
    validate_output_config(&config.output)?;

    if config.input.domain_column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "domain_column cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.max_connections < 1 {
        return Err(ConfigError::Validation(format!(
            "max_connections must be >= 1, got {}",
            config.max_connections
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be > 0".to_string(),
        ));
    }

    if config.site_scheme != "https" && config.site_scheme != "http" {
        return Err(ConfigError::Validation(format!(
            "site_scheme must be 'http' or 'https', got '{}'",
            config.site_scheme
        )));
    }

    for (host, ip) in &config.resolve {
        if ip.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "resolve entry for '{}' is not an IP address: '{}'",
                host, ip
            )));
        }
    }

    Ok(())
}

/// Validates request pacing
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.requests_per_second <= 0.0 || !config.requests_per_second.is_finite() {
        return Err(ConfigError::Validation(format!(
            "requests_per_second must be a positive number, got {}",
            config.requests_per_second
        )));
    }
    Ok(())
}

/// Validates backoff settings
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.multiplier < 1.0 || !config.multiplier.is_finite() {
        return Err(ConfigError::Validation(format!(
            "retry multiplier must be >= 1.0, got {}",
            config.multiplier
        )));
    }

    if config.max_delay_ms < config.initial_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms ({}) must be >= initial_delay_ms ({})",
            config.max_delay_ms, config.initial_delay_ms
        )));
    }

    Ok(())
}

/// Validates detection heuristics, compiling every pattern once
fn validate_detection_config(config: &DetectionConfig) -> Result<(), ConfigError> {
    if config.platform.trim().is_empty() {
        return Err(ConfigError::Validation(
            "detection platform cannot be empty".to_string(),
        ));
    }

    if !config.confirmation_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "confirmation_path must start with '/', got '{}'",
            config.confirmation_path
        )));
    }

    for pattern in config
        .positive_patterns
        .iter()
        .chain(config.negative_patterns.iter())
    {
        validate_pattern(pattern)?;
    }

    Ok(())
}

/// Validates a single detection regular expression
fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Detection pattern cannot be empty".to_string(),
        ));
    }

    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;

    Ok(())
}

/// Validates sitemap bounds
fn validate_sitemap_config(config: &SitemapConfig) -> Result<(), ConfigError> {
    if config.max_depth > 10 {
        return Err(ConfigError::Validation(format!(
            "sitemap max_depth must be <= 10, got {}",
            config.max_depth
        )));
    }

    if config.max_urls_per_sitemap < 1 {
        return Err(ConfigError::Validation(
            "max_urls_per_sitemap must be >= 1".to_string(),
        ));
    }

    if let Some(path) = config.default_paths.iter().find(|p| !p.starts_with('/')) {
        return Err(ConfigError::Validation(format!(
            "default sitemap path must start with '/', got '{}'",
            path
        )));
    }

    Ok(())
}

/// Validates batch settings
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be >= 1, got {}",
            config.chunk_size
        )));
    }

    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    Ok(())
}

/// Validates provider endpoints
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api base_url: {}", e)))?;
    Url::parse(&config.search_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api search_url: {}", e)))?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_path cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern(r"/wp-content/").is_ok());
        assert!(validate_pattern(r"wp-[a-z0-9-]+\.(?:js|css)").is_ok());

        assert!(validate_pattern("").is_err());
        assert!(validate_pattern("wp-(unclosed").is_err());
    }

    #[test]
    fn test_rejects_zero_rate() {
        let mut config = Config::default();
        config.rate_limit.requests_per_second = 0.0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_shrinking_backoff() {
        let mut config = Config::default();
        config.retry.multiplier = 0.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.batch.chunk_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut config = Config::default();
        config.http.site_scheme = "ftp".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_resolve_entries_must_be_ips() {
        let mut config = Config::default();
        config
            .http
            .resolve
            .insert("example.test".to_string(), "127.0.0.1".to_string());
        assert!(validate(&config).is_ok());

        config
            .http
            .resolve
            .insert("www.example.test".to_string(), "localhost".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_relative_default_path() {
        let mut config = Config::default();
        config.sitemap.default_paths = vec!["sitemap.xml".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
