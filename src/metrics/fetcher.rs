use crate::api::{BacklinkSummary, ProviderApi, TechnologyReport};
use crate::model::SiteMetrics;
use crate::RequestError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Metrics for one domain plus what went wrong getting them
#[derive(Debug, Clone, Default)]
pub struct MetricsReport {
    pub metrics: SiteMetrics,
    /// One `"<call>: <error>"` entry per failed lookup
    pub failures: Vec<String>,
    /// True if any lookup was throttled by its provider
    pub rate_limited: bool,
}

impl MetricsReport {
    fn record_failure(&mut self, call: &str, error: &RequestError) {
        if error.is_rate_limit() {
            self.rate_limited = true;
        }
        self.failures.push(format!("{}: {}", call, error));
    }
}

type BacklinkCell = Arc<OnceCell<BacklinkSummary>>;

/// Fetches rank, backlink and search-index metrics
///
/// Clones share the billed-domain memo, so one fetcher per run is enough.
#[derive(Debug, Clone)]
pub struct MetricsFetcher {
    api: ProviderApi,
    billed: Arc<Mutex<HashMap<String, BacklinkCell>>>,
}

impl MetricsFetcher {
    pub fn new(api: ProviderApi) -> Self {
        Self {
            api,
            billed: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetches all metrics for a domain
    ///
    /// The three lookups run concurrently and fail independently; a failed
    /// lookup leaves its fields at zero/absent and is listed in
    /// `failures`. Only a credentials failure is returned as `Err`, since it
    /// will not recover within the run.
    ///
    /// `total_pages` is left at zero; the sitemap crawler owns that field.
    pub async fn fetch_metrics(&self, domain: &str) -> Result<MetricsReport, RequestError> {
        self.fetch_metrics_with(domain, None).await
    }

    /// Like [`fetch_metrics`](Self::fetch_metrics), reusing a technology
    /// report already fetched for this domain instead of paying for the
    /// rank lookup again
    pub async fn fetch_metrics_with(
        &self,
        domain: &str,
        known: Option<&TechnologyReport>,
    ) -> Result<MetricsReport, RequestError> {
        let rank = async {
            match known {
                Some(report) => {
                    tracing::debug!("Reusing technology report for the rank of {}", domain);
                    Ok(report.domain_rank)
                }
                None => self
                    .api
                    .technologies(domain)
                    .await
                    .map(|report| report.domain_rank),
            }
        };

        let (rank, backlinks, indexed) = tokio::join!(
            rank,
            self.backlinks(domain),
            self.api.indexed_pages(domain),
        );

        for result in [
            rank.as_ref().err(),
            backlinks.as_ref().err(),
            indexed.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        {
            if result.is_fatal() {
                return Err(result.clone());
            }
        }

        let mut report = MetricsReport::default();

        match rank {
            Ok(domain_rank) => report.metrics.domain_rank = domain_rank,
            Err(e) => report.record_failure("domain rank", &e),
        }

        match backlinks {
            Ok(summary) => {
                report.metrics.backlink_count = summary.backlinks;
                report.metrics.referring_domains = summary.referring_domains;
            }
            Err(e) => report.record_failure("backlinks", &e),
        }

        match indexed {
            Ok(count) => report.metrics.indexed_pages = count,
            Err(e) => report.record_failure("indexed pages", &e),
        }

        Ok(report)
    }

    /// Backlink summary, requested at most once per domain per run
    ///
    /// Concurrent callers for the same domain wait on the first request. A
    /// failed request leaves the cell empty so a later record may retry.
    async fn backlinks(&self, domain: &str) -> Result<BacklinkSummary, RequestError> {
        let cell = {
            let mut billed = self
                .billed
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(billed.entry(domain.to_string()).or_default())
        };

        if cell.initialized() {
            tracing::debug!("Reusing backlink summary already billed for {}", domain);
        }

        cell.get_or_try_init(|| self.api.backlink_summary(domain))
            .await
            .copied()
    }

    /// Number of domains billed for backlinks so far
    pub fn billed_domains(&self) -> usize {
        let billed = self
            .billed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        billed.values().filter(|cell| cell.initialized()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::RequestClient;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer) -> MetricsFetcher {
        let mut config = Config::default();
        config.rate_limit.requests_per_second = 1000.0;
        config.retry.max_retries = 0;
        config.api.base_url = server.uri();
        config.api.login = "user".to_string();
        config.api.password = "secret".to_string();
        config.api.search_url = format!("{}/customsearch/v1", server.uri());
        config.api.search_key = "key".to_string();
        config.api.search_engine_id = "cx".to_string();

        let client = RequestClient::new(&config).unwrap();
        MetricsFetcher::new(ProviderApi::new(client, config.api.clone()))
    }

    fn task(result: serde_json::Value) -> serde_json::Value {
        json!({"tasks": [{"status_code": 20000, "status_message": "Ok.", "result": [result]}]})
    }

    async fn mount_rank(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/domain_analytics/technologies/domain_technologies/live"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(task(json!({"domain_rank": 250, "technologies": {}}))),
            )
            .mount(server)
            .await;
    }

    async fn mount_search(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"searchInformation": {"totalResults": "1300"}})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_all_metrics() {
        let server = MockServer::start().await;
        mount_rank(&server).await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .and(path("/backlinks/summary/live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task(
                json!({"external_links_count": 900, "referring_domains": 41}),
            )))
            .mount(&server)
            .await;

        let report = fetcher_for(&server).fetch_metrics("example.com").await.unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.metrics.domain_rank, Some(250));
        assert_eq!(report.metrics.backlink_count, 900);
        assert_eq!(report.metrics.referring_domains, 41);
        assert_eq!(report.metrics.indexed_pages, 1300);
        assert_eq!(report.metrics.total_pages, 0);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_values() {
        let server = MockServer::start().await;
        mount_rank(&server).await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .and(path("/backlinks/summary/live"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let report = fetcher_for(&server).fetch_metrics("example.com").await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(report.rate_limited);
        assert_eq!(report.metrics.backlink_count, 0);
        assert_eq!(report.metrics.indexed_pages, 1300);
    }

    #[tokio::test]
    async fn test_bad_credentials_are_fatal() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = fetcher_for(&server).fetch_metrics("example.com").await;

        assert!(matches!(result, Err(RequestError::Authentication { .. })));
    }

    #[tokio::test]
    async fn test_backlinks_billed_once_per_domain() {
        let server = MockServer::start().await;
        mount_rank(&server).await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .and(path("/backlinks/summary/live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task(
                json!({"external_links_count": 12, "referring_domains": 3}),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let (first, second) = tokio::join!(
            fetcher.fetch_metrics("dup.example"),
            fetcher.fetch_metrics("dup.example")
        );

        assert_eq!(first.unwrap().metrics, second.unwrap().metrics);
        assert_eq!(fetcher.billed_domains(), 1);
    }

    #[tokio::test]
    async fn test_known_report_skips_rank_lookup() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .and(path("/domain_analytics/technologies/domain_technologies/live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task(json!({"domain_rank": 1}))))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/backlinks/summary/live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task(
                json!({"external_links_count": 5, "referring_domains": 2}),
            )))
            .mount(&server)
            .await;

        let known = TechnologyReport {
            domain_rank: Some(480),
            ..TechnologyReport::default()
        };
        let report = fetcher_for(&server)
            .fetch_metrics_with("known.example", Some(&known))
            .await
            .unwrap();

        assert_eq!(report.metrics.domain_rank, Some(480));
        assert_eq!(report.metrics.backlink_count, 5);
    }
}
