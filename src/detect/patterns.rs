use crate::config::DetectionConfig;
use crate::ConfigError;
use regex::{Regex, RegexBuilder};

/// A named, compiled detection pattern
#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    regex: Regex,
}

/// Ordered positive patterns and competing-platform veto patterns
#[derive(Debug, Clone)]
pub struct PatternSet {
    positive: Vec<Pattern>,
    negative: Vec<Pattern>,
}

impl PatternSet {
    /// Compiles the detection patterns, case-insensitively
    pub fn compile(config: &DetectionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            positive: compile_all(&config.positive_patterns)?,
            negative: compile_all(&config.negative_patterns)?,
        })
    }

    /// Returns the first positive pattern matching the page, in configured order
    pub fn first_positive(&self, html: &str) -> Option<&str> {
        first_match(&self.positive, html)
    }

    /// Returns the first veto pattern matching the page
    pub fn first_negative(&self, html: &str) -> Option<&str> {
        first_match(&self.negative, html)
    }
}

fn compile_all(sources: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    sources
        .iter()
        .map(|source| {
            RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .map(|regex| Pattern {
                    source: source.clone(),
                    regex,
                })
                .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", source, e)))
        })
        .collect()
}

fn first_match<'a>(patterns: &'a [Pattern], html: &str) -> Option<&'a str> {
    patterns
        .iter()
        .find(|p| p.regex.is_match(html))
        .map(|p| p.source.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_set() -> PatternSet {
        PatternSet::compile(&DetectionConfig::default()).unwrap()
    }

    #[test]
    fn test_positive_in_order() {
        let set = default_set();
        let html = r#"<script src="/wp-includes/js/jquery.js"></script><link href="/wp-content/themes/x.css">"#;
        assert_eq!(set.first_positive(html), Some("/wp-content/"));
    }

    #[test]
    fn test_case_insensitive() {
        let set = default_set();
        assert!(set.first_positive("<a href='/WP-LOGIN.PHP'>").is_some());
        assert!(set.first_negative("var x = DRUPAL.SETTINGS;").is_some());
    }

    #[test]
    fn test_no_match() {
        let set = default_set();
        assert_eq!(set.first_positive("<html><body>Hello</body></html>"), None);
        assert_eq!(set.first_negative("<html><body>Hello</body></html>"), None);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = DetectionConfig {
            positive_patterns: vec!["(".to_string()],
            ..DetectionConfig::default()
        };
        assert!(matches!(
            PatternSet::compile(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
