//! Sitemap discovery and page counting
//!
//! This module counts a site's pages from its sitemaps:
//! - `robots`: `Sitemap:` directives from robots.txt
//! - `xml`: namespace-agnostic sitemap and sitemap-index parsing
//! - `crawler`: the level-by-level worklist that expands sitemap trees

mod crawler;
mod robots;
mod xml;

// Re-export main types
pub use crawler::{
    PageCount, SitemapCrawler, SitemapVisitSet, STATUS_COUNTED, STATUS_NO_SITEMAPS, STATUS_NO_URLS,
};
pub use robots::extract_sitemap_directives;
pub use xml::{decode_sitemap_body, parse_sitemap, SitemapDocument, SitemapKind};
