use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for CMS-Scout
///
/// Every section has defaults, so a configuration file only needs to name
/// the values it changes (usually credentials and output paths).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub detection: DetectionConfig,
    pub sitemap: SitemapConfig,
    pub batch: BatchConfig,
    pub api: ApiConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// HTTP client and connection pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent to target websites and APIs
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total timeout for one attempt (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout for one attempt (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Hard cap on concurrently open connections
    #[serde(rename = "max-connections")]
    pub max_connections: usize,

    /// Idle pooled connections are dropped after this many seconds
    #[serde(rename = "pool-idle-timeout-secs")]
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle connections kept per host
    #[serde(rename = "pool-max-idle-per-host")]
    pub pool_max_idle_per_host: usize,

    /// Scheme used to reach target websites ("https" outside of tests)
    #[serde(rename = "site-scheme")]
    pub site_scheme: String,

    /// Static host to IP address overrides, like `curl --resolve`
    pub resolve: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            request_timeout_secs: 45,
            connect_timeout_secs: 15,
            max_connections: 50,
            pool_idle_timeout_secs: 30,
            pool_max_idle_per_host: 4,
            site_scheme: "https".to_string(),
            resolve: BTreeMap::new(),
        }
    }
}

/// Global request pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum outbound requests per second across the whole run
    #[serde(rename = "requests-per-second")]
    pub requests_per_second: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1.0,
        }
    }
}

/// Exponential backoff configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    /// Growth factor applied per attempt
    pub multiplier: f64,

    /// Upper bound for a single delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Wall-clock ceiling for all attempts of one call (seconds)
    #[serde(rename = "max-elapsed-secs")]
    pub max_elapsed_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 2000,
            multiplier: 2.0,
            max_delay_ms: 15_000,
            max_elapsed_secs: 90,
        }
    }
}

/// CMS detection heuristics
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Platform name matched against generator tags and technology lists
    pub platform: String,

    /// Regular expressions that indicate the platform (checked in order)
    #[serde(rename = "positive-patterns")]
    pub positive_patterns: Vec<String>,

    /// Regular expressions of competing platforms; any match vetoes
    #[serde(rename = "negative-patterns")]
    pub negative_patterns: Vec<String>,

    /// API-discovery path requested to upgrade a pattern match
    #[serde(rename = "confirmation-path")]
    pub confirmation_path: String,

    /// Whether to request the confirmation path at all
    pub confirm: bool,

    /// Whether to ask the technology API when scraping is inconclusive
    #[serde(rename = "technology-fallback")]
    pub technology_fallback: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            platform: "WordPress".to_string(),
            positive_patterns: [
                r"/wp-content/",
                r"/wp-includes/",
                r"wp-[a-z0-9-]+\.(?:js|css)",
                r"wp-json/",
                r"xmlrpc\.php",
                r"wp-login\.php",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            negative_patterns: [
                r"/sites/default/",
                r"Drupal\.settings",
                r"cdn\.shopify\.com",
                r"static\.wixstatic\.com",
                r"static1\.squarespace\.com",
                r"/media/jui/",
                r"/skin/frontend/",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            confirmation_path: "/wp-json/".to_string(),
            confirm: true,
            technology_fallback: true,
        }
    }
}

/// Sitemap discovery bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Deepest sitemap-index nesting that is still expanded (root is 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum `<loc>` entries taken from one document
    #[serde(rename = "max-urls-per-sitemap")]
    pub max_urls_per_sitemap: usize,

    /// Paths tried when robots.txt names no sitemap
    #[serde(rename = "default-paths")]
    pub default_paths: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_urls_per_sitemap: 50_000,
            default_paths: [
                "/sitemap.xml",
                "/sitemap_index.xml",
                "/wp-sitemap.xml",
                "/sitemaps.xml",
                "/sitemap/",
                "/sitemap/sitemap.xml",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }
}

/// Chunking, concurrency and pacing of a batch run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Records processed before the checkpoint advances
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,

    /// Pause between chunks (milliseconds)
    #[serde(rename = "chunk-cooldown-ms")]
    pub chunk_cooldown_ms: u64,

    /// Record pipelines running at once
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Pause between classification and enrichment of one record (milliseconds)
    #[serde(rename = "call-delay-ms")]
    pub call_delay_ms: u64,

    /// Pause after a chunk that hit provider throttling (milliseconds)
    #[serde(rename = "rate-limit-cooldown-ms")]
    pub rate_limit_cooldown_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            chunk_cooldown_ms: 5000,
            max_concurrent: 3,
            call_delay_ms: 1500,
            rate_limit_cooldown_ms: 60_000,
        }
    }
}

/// Ranking, backlink and search API endpoints and credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the ranking/backlink provider
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Basic-auth login for the ranking/backlink provider
    pub login: String,

    /// Basic-auth password for the ranking/backlink provider
    pub password: String,

    /// Search endpoint used for indexed-page counts
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Search API key
    #[serde(rename = "search-key")]
    pub search_key: String,

    /// Search engine identifier
    #[serde(rename = "search-engine-id")]
    pub search_engine_id: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dataforseo.com/v3".to_string(),
            login: String::new(),
            password: String::new(),
            search_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            search_key: String::new(),
            search_engine_id: String::new(),
        }
    }
}

/// Input file layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Column holding the website domain or URL
    #[serde(rename = "domain-column")]
    pub domain_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            domain_column: "website_url".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the checkpoint JSON file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Path to the SQLite recovery store
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory receiving one CSV file per outcome group
    #[serde(rename = "output-dir")]
    pub output_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: "./resume.json".to_string(),
            database_path: "./cms-scout.db".to_string(),
            output_dir: "./output".to_string(),
        }
    }
}
