use super::ProviderApi;
use crate::http::decode_task_results;
use crate::RequestError;
use serde::Deserialize;

const BACKLINKS_PATH: &str = "backlinks/summary/live";

/// Backlink totals for a domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct BacklinkSummary {
    #[serde(rename = "external_links_count", default)]
    pub backlinks: u64,
    #[serde(default)]
    pub referring_domains: u64,
}

impl ProviderApi {
    /// Fetches the backlink summary for a domain
    ///
    /// An empty or malformed response yields zeros.
    pub async fn backlink_summary(&self, domain: &str) -> Result<BacklinkSummary, RequestError> {
        let (url, body) = self.post_task(BACKLINKS_PATH, domain).await?;
        let items: Vec<BacklinkSummary> = decode_task_results(&url, &body);
        Ok(items.into_iter().next().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_summary() {
        let summary: BacklinkSummary =
            serde_json::from_str(r#"{"external_links_count": 1520, "referring_domains": 87, "rank": 3}"#)
                .unwrap();
        assert_eq!(summary.backlinks, 1520);
        assert_eq!(summary.referring_domains, 87);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let summary: BacklinkSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(summary, BacklinkSummary::default());
    }
}
