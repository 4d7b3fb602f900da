//! CMS detection
//!
//! This module decides whether a site runs on the configured platform:
//! - `patterns`: compiled positive and negative structural patterns
//! - `html`: generator meta tag extraction and per-page verdicts
//! - `engine`: the classification engine (scrape first, technology API fallback)

mod engine;
mod html;
mod patterns;

// Re-export main types
pub use engine::{ClassificationEngine, ClassifyReport};
pub use html::{extract_generators, inspect_page, PageVerdict};
pub use patterns::PatternSet;
