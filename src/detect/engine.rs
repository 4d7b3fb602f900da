use crate::api::{ProviderApi, TechnologyReport};
use crate::config::Config;
use crate::detect::html::{inspect_page, PageVerdict};
use crate::detect::patterns::PatternSet;
use crate::http::RequestClient;
use crate::model::{ClassificationResult, ConfidenceSignal};
use crate::url::{alternate_host, site_url};
use crate::{ConfigError, RequestError};
use std::sync::Arc;

/// A verdict plus what the technology API said while reaching it
#[derive(Debug, Clone)]
pub struct ClassifyReport {
    pub result: ClassificationResult,
    /// Technology report fetched by the fallback, reusable for the domain rank
    pub technologies: Option<TechnologyReport>,
    /// Failure of the technology API, if the fallback ran and failed
    pub provider_error: Option<RequestError>,
}

impl ClassifyReport {
    fn from_result(result: ClassificationResult) -> Self {
        Self {
            result,
            technologies: None,
            provider_error: None,
        }
    }
}

/// Decides whether a domain runs on the configured platform
///
/// Classification always produces a result: fetch and parse errors are
/// logged and the domain ends up `Unknown`.
#[derive(Debug, Clone)]
pub struct ClassificationEngine {
    config: Arc<Config>,
    client: RequestClient,
    api: ProviderApi,
    patterns: PatternSet,
}

impl ClassificationEngine {
    /// Creates an engine, compiling the configured patterns
    pub fn new(config: Arc<Config>, client: RequestClient, api: ProviderApi) -> Result<Self, ConfigError> {
        let patterns = PatternSet::compile(&config.detection)?;
        Ok(Self {
            config,
            client,
            api,
            patterns,
        })
    }

    /// Classifies one normalized domain
    ///
    /// # Flow
    ///
    /// 1. Fetch the root page of the domain and inspect it
    /// 2. If the fetch failed or the page was inconclusive, repeat once on the
    ///    `www.`-toggled host
    /// 3. If every page was inconclusive, ask the technology API
    /// 4. Otherwise the domain is `Unknown`
    ///
    /// A technology API failure still yields a result (`Unknown`); the error
    /// is handed back so the caller can cool down or stop the run.
    pub async fn classify(&self, domain: &str) -> ClassifyReport {
        let mut hosts = vec![domain.to_string()];
        if let Some(alternate) = alternate_host(domain) {
            hosts.push(alternate);
        }

        for host in &hosts {
            if let Some(result) = self.classify_host(domain, host).await {
                return ClassifyReport::from_result(result);
            }
        }

        if self.config.detection.technology_fallback {
            return self.classify_by_technologies(domain).await;
        }

        tracing::info!("No platform signal for {}", domain);
        ClassifyReport::from_result(ClassificationResult::unknown(domain))
    }

    /// Inspects one host's root page; None when the host gave no verdict
    async fn classify_host(&self, domain: &str, host: &str) -> Option<ClassificationResult> {
        let scheme = &self.config.http.site_scheme;
        let url = match site_url(scheme, host, "/") {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build URL for {}: {}", host, e);
                return None;
            }
        };

        let page = match self.client.get(url.as_str()).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                tracing::debug!("{} answered HTTP {}", url, page.status);
                return None;
            }
            Err(e) => {
                tracing::debug!("Fetching {} failed: {}", url, e);
                return None;
            }
        };

        let platform = &self.config.detection.platform;
        match inspect_page(&page.body, platform, &self.patterns) {
            PageVerdict::Generator(generator) => {
                tracing::info!("{}: generator tag '{}'", domain, generator);
                Some(
                    ClassificationResult::detected(domain, ConfidenceSignal::MetaTag, generator)
                        .on_host(host),
                )
            }
            PageVerdict::Vetoed(pattern) => {
                tracing::info!("{}: competing platform pattern '{}'", domain, pattern);
                Some(
                    ClassificationResult::not_detected(
                        domain,
                        ConfidenceSignal::ContentPattern,
                        pattern,
                    )
                    .on_host(host),
                )
            }
            PageVerdict::Pattern(pattern) => {
                let signal = if self.confirm(host).await {
                    ConfidenceSignal::ScrapeConfirmed
                } else {
                    ConfidenceSignal::ContentPattern
                };
                tracing::info!("{}: pattern '{}' ({})", domain, pattern, signal);
                Some(ClassificationResult::detected(domain, signal, pattern).on_host(host))
            }
            PageVerdict::Inconclusive => None,
        }
    }

    /// Requests the API-discovery path; true only for HTTP 200
    ///
    /// Confirmation upgrades the signal but never downgrades a match.
    async fn confirm(&self, host: &str) -> bool {
        if !self.config.detection.confirm {
            return false;
        }

        let path = &self.config.detection.confirmation_path;
        let Ok(url) = site_url(&self.config.http.site_scheme, host, path) else {
            return false;
        };

        match self.client.get(url.as_str()).await {
            Ok(response) => response.is_ok(),
            Err(e) => {
                tracing::debug!("Confirmation request to {} failed: {}", url, e);
                false
            }
        }
    }

    async fn classify_by_technologies(&self, domain: &str) -> ClassifyReport {
        let report = match self.api.technologies(domain).await {
            Ok(report) => report,
            Err(e) => {
                if e.is_fatal() {
                    tracing::error!("Technology lookup rejected credentials: {}", e);
                } else {
                    tracing::warn!("Technology lookup for {} failed: {}", domain, e);
                }
                return ClassifyReport {
                    result: ClassificationResult::unknown(domain),
                    technologies: None,
                    provider_error: Some(e),
                };
            }
        };

        let platform = &self.config.detection.platform;
        let result = if let Some(name) = report.find_platform(platform) {
            tracing::info!("{}: technology list names '{}'", domain, name);
            ClassificationResult::detected(domain, ConfidenceSignal::ApiTechnologyList, name)
        } else if let Some(other) = report.cms.first() {
            tracing::info!("{}: technology list names CMS '{}'", domain, other);
            ClassificationResult::not_detected(domain, ConfidenceSignal::ApiTechnologyList, other.clone())
        } else {
            tracing::info!("No platform signal for {}", domain);
            ClassificationResult::unknown(domain)
        };

        ClassifyReport {
            result,
            technologies: Some(report),
            provider_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CmsLabel;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_for(server: &MockServer, fallback: bool) -> ClassificationEngine {
        let mut config = Config::default();
        config.http.site_scheme = "http".to_string();
        config.rate_limit.requests_per_second = 1000.0;
        config.retry.max_retries = 0;
        config.api.base_url = server.uri();
        config.api.login = "user".to_string();
        config.api.password = "secret".to_string();
        config.detection.technology_fallback = fallback;
        let config = Arc::new(config);

        let client = RequestClient::new(&config).unwrap();
        let api = ProviderApi::new(client.clone(), config.api.clone());
        ClassificationEngine::new(config, client, api).unwrap()
    }

    fn host_of(server: &MockServer) -> String {
        server.uri().trim_start_matches("http://").to_string()
    }

    async fn serve_root(server: &MockServer, html: &str) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html.to_string()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_meta_generator() {
        let server = MockServer::start().await;
        serve_root(
            &server,
            r#"<html><head><meta name="generator" content="WordPress 6.3"></head></html>"#,
        )
        .await;

        let engine = engine_for(&server, false);
        let result = engine.classify(&host_of(&server)).await.result;

        assert_eq!(result.cms_label, CmsLabel::Detected);
        assert_eq!(result.confidence_signal, Some(ConfidenceSignal::MetaTag));
        assert_eq!(result.evidence.as_deref(), Some("WordPress 6.3"));
    }

    #[tokio::test]
    async fn test_veto_wins() {
        let server = MockServer::start().await;
        serve_root(
            &server,
            r#"<body><a href="/wp-login.php">x</a><img src="/sites/default/files/a.png"></body>"#,
        )
        .await;

        let engine = engine_for(&server, false);
        let result = engine.classify(&host_of(&server)).await.result;

        assert_eq!(result.cms_label, CmsLabel::NotDetected);
    }

    #[tokio::test]
    async fn test_pattern_confirmed() {
        let server = MockServer::start().await;
        serve_root(&server, r#"<link href="/wp-content/themes/a/style.css">"#).await;
        Mock::given(method("GET"))
            .and(path("/wp-json/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let engine = engine_for(&server, false);
        let result = engine.classify(&host_of(&server)).await.result;

        assert_eq!(result.cms_label, CmsLabel::Detected);
        assert_eq!(
            result.confidence_signal,
            Some(ConfidenceSignal::ScrapeConfirmed)
        );
    }

    #[tokio::test]
    async fn test_pattern_without_confirmation_stays_detected() {
        let server = MockServer::start().await;
        serve_root(&server, r#"<link href="/wp-content/themes/a/style.css">"#).await;
        Mock::given(method("GET"))
            .and(path("/wp-json/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let engine = engine_for(&server, false);
        let result = engine.classify(&host_of(&server)).await.result;

        assert_eq!(result.cms_label, CmsLabel::Detected);
        assert_eq!(
            result.confidence_signal,
            Some(ConfidenceSignal::ContentPattern)
        );
    }

    #[tokio::test]
    async fn test_non_200_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let engine = engine_for(&server, false);
        let result = engine.classify(&host_of(&server)).await.result;

        assert_eq!(result.cms_label, CmsLabel::Unknown);
        assert!(result.confidence_signal.is_none());
    }

    #[tokio::test]
    async fn test_technology_fallback() {
        let server = MockServer::start().await;
        serve_root(&server, "<html><body>plain</body></html>").await;
        Mock::given(method("POST"))
            .and(path("/domain_analytics/technologies/domain_technologies/live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tasks": [{
                    "status_code": 20000,
                    "result": [{"domain_rank": 410, "technologies": {"content": {"cms": ["WordPress"]}}}]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(&server, true);
        let report = engine.classify(&host_of(&server)).await;

        assert_eq!(report.result.cms_label, CmsLabel::Detected);
        assert_eq!(
            report.result.confidence_signal,
            Some(ConfidenceSignal::ApiTechnologyList)
        );
        assert!(report.provider_error.is_none());
        assert_eq!(report.technologies.unwrap().domain_rank, Some(410));
    }

    #[tokio::test]
    async fn test_fallback_reports_throttling() {
        let server = MockServer::start().await;
        serve_root(&server, "<html><body>plain</body></html>").await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let engine = engine_for(&server, true);
        let report = engine.classify(&host_of(&server)).await;

        assert_eq!(report.result.cms_label, CmsLabel::Unknown);
        assert!(report.technologies.is_none());
        assert!(report.provider_error.unwrap().is_rate_limit());
    }

    #[tokio::test]
    async fn test_fallback_reports_rejected_credentials() {
        let server = MockServer::start().await;
        serve_root(&server, "<html><body>plain</body></html>").await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let engine = engine_for(&server, true);
        let report = engine.classify(&host_of(&server)).await;

        assert_eq!(report.result.cms_label, CmsLabel::Unknown);
        assert!(report.provider_error.unwrap().is_fatal());
    }

    #[tokio::test]
    async fn test_fallback_malformed_response_is_unknown() {
        let server = MockServer::start().await;
        serve_root(&server, "<html><body>plain</body></html>").await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"tasks\": []}"))
            .mount(&server)
            .await;

        let engine = engine_for(&server, true);
        let result = engine.classify(&host_of(&server)).await.result;

        assert_eq!(result.cms_label, CmsLabel::Unknown);
    }
}
