//! CMS-Scout: a resumable CMS classification and enrichment pipeline
//!
//! This crate takes a list of website domains, decides for each one whether it
//! runs on a configured content-management platform, and enriches the matches
//! with authority, backlink, sitemap and search-index metrics. Work is split
//! into checkpointed chunks so large jobs survive crashes and provider
//! throttling.

pub mod api;
pub mod batch;
pub mod config;
pub mod detect;
pub mod http;
pub mod input;
pub mod metrics;
pub mod model;
pub mod output;
pub mod sitemap;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for CMS-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Failed to read checkpoint {path}: {source}")]
    CheckpointRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write checkpoint {path}: {source}")]
    CheckpointWrite {
        path: String,
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid job state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: model::JobState,
        to: model::JobState,
    },

    #[error("Input error: {0}")]
    Input(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid detection pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Outcome classes of a single outbound request
///
/// | Condition | Variant | Retried |
/// |-----------|---------|---------|
/// | HTTP 401 | `Authentication` | no |
/// | HTTP 429 | `RateLimited` | no |
/// | HTTP 5xx | `Service` | yes |
/// | Transport error | `Network` | yes |
/// | Timeout | `Timeout` | yes |
/// | Other 4xx | `Status` | no |
/// | Unreadable body | `Parse` | no |
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    #[error("Authentication failed for {url}")]
    Authentication { url: String },

    #[error("Rate limit exceeded for {url}")]
    RateLimited { url: String },

    #[error("Service unavailable for {url} (HTTP {status})")]
    Service { url: String, status: u16 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed response from {url}: {message}")]
    Parse { url: String, message: String },
}

impl RequestError {
    /// Returns true for transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Service { .. } | Self::Network { .. } | Self::Timeout { .. }
        )
    }

    /// Returns true if the whole run should stop
    ///
    /// Credentials do not become valid mid-run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns true for provider-level throttling
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type alias for CMS-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use batch::{submit_batch, BatchScheduler, JobEvent, JobHandle};
pub use config::Config;
pub use detect::ClassificationEngine;
pub use model::{
    ClassificationResult, CmsLabel, ConfidenceSignal, JobState, OutcomeStatus, ProcessingOutcome,
    SiteMetrics, SiteRecord,
};
pub use sitemap::SitemapCrawler;
