use crate::config::Config;
use crate::detect::ClassificationEngine;
use crate::metrics::MetricsFetcher;
use crate::model::{OutcomeStatus, ProcessingOutcome, SiteRecord};
use crate::sitemap::SitemapCrawler;
use crate::url::normalize_domain;
use crate::RequestError;
use std::sync::Arc;
use std::time::Duration;

/// What one record's pipeline produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub outcome: ProcessingOutcome,
    /// A provider throttled at least one call
    pub rate_limited: bool,
    /// An error that should stop the whole run
    pub fatal: Option<RequestError>,
}

impl PipelineOutput {
    fn done(outcome: ProcessingOutcome) -> Self {
        Self {
            outcome,
            rate_limited: false,
            fatal: None,
        }
    }
}

/// Classify → enrich for a single record
///
/// Enrichment (sitemap page count and metrics) only runs for domains
/// classified `Detected`.
#[derive(Debug, Clone)]
pub struct SitePipeline {
    config: Arc<Config>,
    engine: ClassificationEngine,
    crawler: SitemapCrawler,
    metrics: MetricsFetcher,
}

impl SitePipeline {
    pub fn new(
        config: Arc<Config>,
        engine: ClassificationEngine,
        crawler: SitemapCrawler,
        metrics: MetricsFetcher,
    ) -> Self {
        Self {
            config,
            engine,
            crawler,
            metrics,
        }
    }

    /// Processes one record; never returns an error
    pub async fn process(&self, record: SiteRecord) -> PipelineOutput {
        let domain = match normalize_domain(&record.domain) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::warn!("Row {}: invalid domain '{}': {}", record.index, record.domain, e);
                return PipelineOutput::done(ProcessingOutcome::failed(
                    record,
                    format!("invalid domain: {}", e),
                ));
            }
        };

        let mut outcome = ProcessingOutcome::started(record);
        let classified = self.engine.classify(&domain).await;
        outcome.classification = classified.result;

        let mut rate_limited = false;
        if let Some(e) = classified.provider_error {
            if e.is_fatal() {
                tracing::error!("{}: {}", domain, e);
                outcome.status = OutcomeStatus::Failed;
                outcome.error_detail = Some(e.to_string());
                return PipelineOutput {
                    outcome,
                    rate_limited: false,
                    fatal: Some(e),
                };
            }
            rate_limited = e.is_rate_limit();
            outcome.note_failure(format!("technology lookup: {}", e));
        }

        if !outcome.classification.cms_label.is_detected() {
            return PipelineOutput {
                outcome,
                rate_limited,
                fatal: None,
            };
        }

        let delay = Duration::from_millis(self.config.batch.call_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        // Sitemaps live on the host that answered, which may be the www. alternate
        let site_host = outcome
            .classification
            .host
            .clone()
            .unwrap_or_else(|| domain.clone());

        let (pages, metrics) = tokio::join!(
            self.crawler.discover_page_count(&site_host),
            self.metrics
                .fetch_metrics_with(&domain, classified.technologies.as_ref()),
        );

        let report = match metrics {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("{}: {}", domain, e);
                outcome.status = OutcomeStatus::Failed;
                outcome.error_detail = Some(e.to_string());
                return PipelineOutput {
                    outcome,
                    rate_limited: false,
                    fatal: Some(e),
                };
            }
        };

        outcome.metrics = report.metrics;
        outcome.metrics.total_pages = pages.count;
        outcome.page_count_status = Some(pages.status);
        for failure in &report.failures {
            outcome.note_failure(failure);
        }

        tracing::info!(
            "{}: {} pages, {} indexed, {} backlinks",
            domain,
            outcome.metrics.total_pages,
            outcome.metrics.indexed_pages,
            outcome.metrics.backlink_count
        );

        PipelineOutput {
            outcome,
            rate_limited: rate_limited || report.rate_limited,
            fatal: None,
        }
    }
}
