use crate::detect::patterns::PatternSet;
use scraper::{Html, Selector};

/// What a single page says about the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    /// A generator meta tag names the platform
    Generator(String),
    /// A competing-platform pattern matched
    Vetoed(String),
    /// A positive pattern matched and nothing vetoed it
    Pattern(String),
    /// No signal either way
    Inconclusive,
}

/// Extracts the content of every `<meta name="generator">` tag
///
/// The attribute name comparison is case-insensitive.
pub fn extract_generators(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("meta[name][content]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("generator"))
        })
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .collect()
}

/// Evaluates one page
///
/// # Order
///
/// 1. A generator tag containing `platform` wins outright
/// 2. Any negative pattern vetoes the page
/// 3. The first positive pattern gives a tentative match
/// 4. Otherwise the page is inconclusive
pub fn inspect_page(html: &str, platform: &str, patterns: &PatternSet) -> PageVerdict {
    let needle = platform.to_lowercase();
    if let Some(generator) = extract_generators(html)
        .into_iter()
        .find(|g| g.to_lowercase().contains(&needle))
    {
        return PageVerdict::Generator(generator);
    }

    if let Some(veto) = patterns.first_negative(html) {
        return PageVerdict::Vetoed(veto.to_string());
    }

    match patterns.first_positive(html) {
        Some(pattern) => PageVerdict::Pattern(pattern.to_string()),
        None => PageVerdict::Inconclusive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;

    fn patterns() -> PatternSet {
        PatternSet::compile(&DetectionConfig::default()).unwrap()
    }

    #[test]
    fn test_extract_generator() {
        let html = r#"<html><head><meta name="generator" content="WordPress 6.3"></head></html>"#;
        assert_eq!(extract_generators(html), vec!["WordPress 6.3".to_string()]);
    }

    #[test]
    fn test_generator_name_case_insensitive() {
        let html = r#"<head><META NAME="Generator" CONTENT=" Hugo 0.120 "></head>"#;
        assert_eq!(extract_generators(html), vec!["Hugo 0.120".to_string()]);
    }

    #[test]
    fn test_ignores_other_meta() {
        let html = r#"<head><meta name="description" content="WordPress tips"></head>"#;
        assert!(extract_generators(html).is_empty());
    }

    #[test]
    fn test_generator_short_circuits() {
        let html = r#"<head><meta name="generator" content="WordPress 6.3"></head>
                      <body><img src="/sites/default/files/logo.png"></body>"#;
        assert_eq!(
            inspect_page(html, "WordPress", &patterns()),
            PageVerdict::Generator("WordPress 6.3".to_string())
        );
    }

    #[test]
    fn test_veto_beats_positive() {
        let html = r#"<body><a href="/wp-content/uploads/a.pdf">x</a>
                      <img src="/sites/default/files/logo.png"></body>"#;
        assert_eq!(
            inspect_page(html, "WordPress", &patterns()),
            PageVerdict::Vetoed("/sites/default/".to_string())
        );
    }

    #[test]
    fn test_positive_pattern() {
        let html = r#"<link rel="stylesheet" href="/wp-content/themes/twenty/style.css">"#;
        assert_eq!(
            inspect_page(html, "WordPress", &patterns()),
            PageVerdict::Pattern("/wp-content/".to_string())
        );
    }

    #[test]
    fn test_other_generator_is_not_a_match() {
        let html = r#"<head><meta name="generator" content="Joomla! - Open Source"></head>"#;
        assert_eq!(
            inspect_page(html, "WordPress", &patterns()),
            PageVerdict::Inconclusive
        );
    }
}
