use crate::config::Config;
use crate::http::RequestClient;
use crate::sitemap::robots::extract_sitemap_directives;
use crate::sitemap::xml::{decode_sitemap_body, parse_sitemap, SitemapKind};
use crate::url::{resolve_location, site_url};
use crate::RequestError;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

pub const STATUS_NO_SITEMAPS: &str = "no sitemaps found";
pub const STATUS_NO_URLS: &str = "no URLs found";
pub const STATUS_COUNTED: &str = "counted from sitemaps";

/// Result of counting a domain's pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCount {
    pub count: u64,
    pub status: String,
}

impl PageCount {
    fn new(count: u64, status: &str) -> Self {
        Self {
            count,
            status: status.to_string(),
        }
    }
}

/// Page URLs collected while crawling one domain's sitemaps
///
/// Deduplicates by exact URL string and is dropped once the count is taken.
#[derive(Debug, Default)]
pub struct SitemapVisitSet {
    urls: HashSet<String>,
}

impl SitemapVisitSet {
    /// Adds a URL; returns false if it was already present
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// A sitemap waiting to be expanded, with its body if the default-path check already read it
#[derive(Debug)]
struct PendingSitemap {
    url: Url,
    body: Option<Vec<u8>>,
}

/// Discovers and expands a domain's sitemap tree
///
/// Expansion runs level by level over an explicit worklist. Each level is
/// fetched concurrently; every sitemap URL is fetched at most once, so an
/// index that points back at an ancestor does not loop.
#[derive(Debug, Clone)]
pub struct SitemapCrawler {
    config: Arc<Config>,
    client: RequestClient,
}

impl SitemapCrawler {
    pub fn new(config: Arc<Config>, client: RequestClient) -> Self {
        Self { config, client }
    }

    /// Counts the distinct page URLs listed in a domain's sitemaps
    ///
    /// # Flow
    ///
    /// 1. Read `Sitemap:` directives from robots.txt
    /// 2. Only if there are none, try the default paths concurrently
    /// 3. Expand sitemap indexes down to `max-depth`, collecting leaf `<loc>` values
    ///
    /// Failing branches contribute nothing; the count never errors.
    pub async fn discover_page_count(&self, domain: &str) -> PageCount {
        let mut roots = self.sitemaps_from_robots(domain).await;
        if roots.is_empty() {
            roots = self.try_default_paths(domain).await;
        }

        if roots.is_empty() {
            tracing::info!("{}: {}", domain, STATUS_NO_SITEMAPS);
            return PageCount::new(0, STATUS_NO_SITEMAPS);
        }

        let pages = self.expand(roots).await;
        if pages.is_empty() {
            tracing::info!("{}: {}", domain, STATUS_NO_URLS);
            return PageCount::new(0, STATUS_NO_URLS);
        }

        tracing::info!("{}: {} pages in sitemaps", domain, pages.len());
        PageCount::new(pages.len() as u64, STATUS_COUNTED)
    }

    async fn sitemaps_from_robots(&self, domain: &str) -> Vec<PendingSitemap> {
        let robots_url = match site_url(&self.config.http.site_scheme, domain, "/robots.txt") {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build robots.txt URL for {}: {}", domain, e);
                return Vec::new();
            }
        };

        let body = match self.client.get(robots_url.as_str()).await {
            Ok(response) => response.body,
            Err(RequestError::Status { status, .. }) if status == 403 || status == 404 => {
                tracing::debug!("{} has no robots.txt (HTTP {})", domain, status);
                return Vec::new();
            }
            Err(e) => {
                tracing::debug!("Fetching robots.txt for {} failed: {}", domain, e);
                return Vec::new();
            }
        };

        extract_sitemap_directives(&body)
            .iter()
            .filter_map(|value| resolve_location(&robots_url, value))
            .map(|url| PendingSitemap { url, body: None })
            .collect()
    }

    async fn try_default_paths(&self, domain: &str) -> Vec<PendingSitemap> {
        let scheme = &self.config.http.site_scheme;
        let candidates: Vec<Url> = self
            .config
            .sitemap
            .default_paths
            .iter()
            .filter_map(|path| site_url(scheme, domain, path).ok())
            .collect();

        tracing::debug!("Trying {} default sitemap paths for {}", candidates.len(), domain);

        let attempts = candidates.into_iter().map(|url| async move {
            match self.client.get(url.as_str()).await {
                Ok(response) if response.is_ok() => Some(PendingSitemap {
                    url,
                    body: Some(response.bytes),
                }),
                _ => None,
            }
        });

        join_all(attempts).await.into_iter().flatten().collect()
    }

    /// Expands the worklist level by level and returns the collected pages
    async fn expand(&self, roots: Vec<PendingSitemap>) -> SitemapVisitSet {
        let max_depth = self.config.sitemap.max_depth;
        let max_urls = self.config.sitemap.max_urls_per_sitemap;

        let mut pages = SitemapVisitSet::default();
        let mut seen_sitemaps: HashSet<String> = HashSet::new();
        let mut level: Vec<PendingSitemap> = roots
            .into_iter()
            .filter(|s| seen_sitemaps.insert(s.url.to_string()))
            .collect();
        let mut depth: u32 = 0;

        while !level.is_empty() {
            let documents = join_all(level.into_iter().map(|s| self.load(s))).await;
            let mut next_level = Vec::new();

            for (url, bytes) in documents.into_iter().flatten() {
                let document = match decode_sitemap_body(&bytes)
                    .and_then(|body| parse_sitemap(&body, max_urls))
                {
                    Ok(document) => document,
                    Err(e) => {
                        tracing::debug!("Skipping unparseable sitemap {}: {}", url, e);
                        continue;
                    }
                };
                if document.truncated {
                    tracing::warn!("{} lists more than {} URLs, truncated", url, max_urls);
                }

                match document.kind {
                    SitemapKind::UrlSet => {
                        for loc in &document.locations {
                            if let Some(page) = page_key(&url, loc) {
                                pages.insert(page);
                            }
                        }
                    }
                    SitemapKind::Index if depth >= max_depth => {
                        tracing::debug!(
                            "Not expanding {} ({} children) beyond depth {}",
                            url,
                            document.locations.len(),
                            max_depth
                        );
                    }
                    SitemapKind::Index => {
                        for loc in &document.locations {
                            let Some(child) = resolve_location(&url, loc) else {
                                continue;
                            };
                            if seen_sitemaps.insert(child.to_string()) {
                                next_level.push(PendingSitemap {
                                    url: child,
                                    body: None,
                                });
                            }
                        }
                    }
                }
            }

            level = next_level;
            depth += 1;
        }

        pages
    }

    /// Returns the body of a pending sitemap, fetching it if needed
    async fn load(&self, sitemap: PendingSitemap) -> Option<(Url, Vec<u8>)> {
        if let Some(body) = sitemap.body {
            return Some((sitemap.url, body));
        }

        match self.client.get(sitemap.url.as_str()).await {
            Ok(response) if response.is_ok() => Some((sitemap.url, response.bytes)),
            Ok(response) => {
                tracing::debug!("Sitemap {} answered HTTP {}", sitemap.url, response.status);
                None
            }
            Err(e) => {
                tracing::debug!("Fetching sitemap {} failed: {}", sitemap.url, e);
                None
            }
        }
    }
}

/// Dedup key of a page `<loc>`
///
/// Absolute locations are kept exactly as written (trimmed); relative ones
/// are resolved against the sitemap URL. Non-HTTP locations are dropped.
fn page_key(sitemap_url: &Url, loc: &str) -> Option<String> {
    let resolved = resolve_location(sitemap_url, loc)?;
    let loc = loc.trim();
    if Url::parse(loc).is_ok() {
        Some(loc.to_string())
    } else {
        Some(resolved.to_string())
    }
}
