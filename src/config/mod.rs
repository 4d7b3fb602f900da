//! Configuration module for CMS-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The resulting [`Config`] is immutable and shared by reference with every
//! component constructor.
//!
//! # Example
//!
//! ```no_run
//! use cms_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Chunk size: {}", config.batch.chunk_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, BatchConfig, Config, DetectionConfig, HttpConfig, InputConfig, OutputConfig,
    RateLimitConfig, RetryConfig, SitemapConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
