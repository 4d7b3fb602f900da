//! Typed clients for the external ranking and search APIs
//!
//! - `technologies`: technology detection plus domain rank for one target
//! - `backlinks`: backlink summary for one target
//! - `search`: indexed-page count from a `site:` query
//!
//! All calls go through the shared [`RequestClient`], so they are paced,
//! retried and capped together with website fetches.

mod backlinks;
mod search;
mod technologies;

use crate::config::ApiConfig;
use crate::http::RequestClient;
use serde::Serialize;

pub use backlinks::BacklinkSummary;
pub use search::parse_total_results;
pub use technologies::{flatten_technologies, TechnologyReport};

/// Body item accepted by the ranking provider's live endpoints
#[derive(Debug, Clone, Serialize)]
struct TaskRequest<'a> {
    target: &'a str,
    limit: u32,
}

/// Client for the ranking/backlink provider and the search API
#[derive(Debug, Clone)]
pub struct ProviderApi {
    client: RequestClient,
    config: ApiConfig,
}

impl ProviderApi {
    pub fn new(client: RequestClient, config: ApiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Posts a single-target task and returns the raw response body
    async fn post_task(&self, path: &str, domain: &str) -> Result<(String, String), crate::RequestError> {
        let url = self.endpoint(path);
        let body = [TaskRequest {
            target: domain,
            limit: 1,
        }];

        let response = self
            .client
            .post_json(&url, &body, &self.config.login, &self.config.password)
            .await?;

        Ok((url, response.body))
    }
}
