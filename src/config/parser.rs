use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variables that override provider credentials
const ENV_API_LOGIN: &str = "CMS_SCOUT_API_LOGIN";
const ENV_API_PASSWORD: &str = "CMS_SCOUT_API_PASSWORD";
const ENV_SEARCH_KEY: &str = "CMS_SCOUT_SEARCH_KEY";
const ENV_SEARCH_ENGINE_ID: &str = "CMS_SCOUT_SEARCH_ENGINE_ID";

/// Loads and parses a configuration file from the given path
///
/// Credentials found in the environment replace the file values before
/// validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Parses TOML content into a configuration without touching the environment
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// Replaces provider credentials with any values set in the environment
pub fn apply_env_overrides(config: &mut Config) {
    let overrides = [
        (ENV_API_LOGIN, &mut config.api.login),
        (ENV_API_PASSWORD, &mut config.api.password),
        (ENV_SEARCH_KEY, &mut config.api.search_key),
        (ENV_SEARCH_ENGINE_ID, &mut config.api.search_engine_id),
    ];

    for (name, slot) in overrides {
        if let Ok(value) = std::env::var(name) {
            if !value.is_empty() {
                tracing::debug!("Using {} from environment", name);
                *slot = value;
            }
        }
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored on each run so a resumed run can be matched with the
/// configuration that started it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[rate-limit]
requests-per-second = 2.5

[retry]
max-retries = 5
initial-delay-ms = 100
max-delay-ms = 1000

[detection]
platform = "WordPress"
negative-patterns = ["/sites/default/"]

[batch]
chunk-size = 25
max-concurrent = 4

[api]
base-url = "https://api.example.com/v3"

[output]
checkpoint-path = "./state/resume.json"
database-path = "./state/scout.db"
output-dir = "./state/out"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.rate_limit.requests_per_second, 2.5);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.multiplier, 2.0);
        assert_eq!(config.batch.chunk_size, 25);
        assert_eq!(config.batch.max_concurrent, 4);
        assert_eq!(config.detection.negative_patterns.len(), 1);
        assert!(!config.detection.positive_patterns.is_empty());
        assert_eq!(config.sitemap.max_depth, 2);
        assert_eq!(config.output.output_dir, "./state/out");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.batch.chunk_size, 10);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.http.max_connections, 50);
        assert_eq!(config.input.domain_column, "website_url");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/scout.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[batch]
max-concurrent = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_config_with_bad_pattern() {
        let config_content = r#"
[detection]
positive-patterns = ["wp-(broken"]
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidPattern(_)));
    }

    #[test]
    fn test_config_hash_is_sha256_hex() {
        let file = create_temp_config("abc");
        assert_eq!(
            compute_config_hash(file.path()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        let edited = create_temp_config("abc\n");
        assert_ne!(
            compute_config_hash(edited.path()).unwrap(),
            compute_config_hash(file.path()).unwrap()
        );
    }

    #[test]
    fn test_env_overrides_search_engine_id() {
        let mut config = parse_config("[api]\nsearch-engine-id = \"from-file\"").unwrap();
        assert_eq!(config.api.search_engine_id, "from-file");

        std::env::set_var(ENV_SEARCH_ENGINE_ID, "from-env");
        apply_env_overrides(&mut config);
        std::env::remove_var(ENV_SEARCH_ENGINE_ID);

        assert_eq!(config.api.search_engine_id, "from-env");
    }
}
