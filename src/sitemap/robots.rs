//! robots.txt handling
//!
//! Only `Sitemap:` directives are read. Allow/Disallow rules do not apply:
//! the pipeline fetches the root page, robots.txt and sitemaps only.

/// Extracts `Sitemap:` directive values from robots.txt content
///
/// The directive name is matched case-insensitively after leading
/// whitespace. The value is everything after the first `:`, trimmed.
/// Duplicate values are collapsed, keeping first-seen order.
///
/// # Example
///
/// ```
/// use cms_scout::sitemap::extract_sitemap_directives;
///
/// let robots = "User-agent: *\nDisallow: /wp-admin/\nSITEMAP: https://example.com/sitemap.xml\n";
/// assert_eq!(
///     extract_sitemap_directives(robots),
///     vec!["https://example.com/sitemap.xml".to_string()]
/// );
/// ```
pub fn extract_sitemap_directives(content: &str) -> Vec<String> {
    let mut sitemaps: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim_start();
        let Some(prefix) = line.get(..8) else {
            continue;
        };
        if !prefix.eq_ignore_ascii_case("sitemap:") {
            continue;
        }

        let Some((_, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if !value.is_empty() && !sitemaps.iter().any(|s| s == value) {
            sitemaps.push(value.to_string());
        }
    }

    sitemaps
}
