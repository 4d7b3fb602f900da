use super::ProviderApi;
use crate::RequestError;
use serde_json::Value;

/// Reads `searchInformation.totalResults` from a search response
///
/// The field is a numeric string in practice but a number is accepted too.
/// Anything absent or non-numeric counts as zero.
pub fn parse_total_results(body: &str) -> u64 {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return 0;
    };

    match value.pointer("/searchInformation/totalResults") {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

impl ProviderApi {
    /// Counts pages the search engine has indexed for a domain
    ///
    /// Returns zero without a request when no search key is configured.
    pub async fn indexed_pages(&self, domain: &str) -> Result<u64, RequestError> {
        if self.config.search_key.is_empty() || self.config.search_engine_id.is_empty() {
            tracing::debug!("Search API not configured, skipping indexed count for {}", domain);
            return Ok(0);
        }

        let query = format!("site:{}", domain);
        let response = self
            .client
            .get_with_query(
                &self.config.search_url,
                &[
                    ("key", self.config.search_key.as_str()),
                    ("cx", self.config.search_engine_id.as_str()),
                    ("q", query.as_str()),
                    ("num", "1"),
                ],
            )
            .await?;

        let count = parse_total_results(&response.body);
        tracing::debug!("Search reports {} indexed pages for {}", count, domain);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_count() {
        assert_eq!(
            parse_total_results(r#"{"searchInformation":{"totalResults":"4210"}}"#),
            4210
        );
    }

    #[test]
    fn test_numeric_count() {
        assert_eq!(
            parse_total_results(r#"{"searchInformation":{"totalResults":17}}"#),
            17
        );
    }

    #[test]
    fn test_non_numeric_is_zero() {
        assert_eq!(
            parse_total_results(r#"{"searchInformation":{"totalResults":"about 4k"}}"#),
            0
        );
        assert_eq!(parse_total_results(r#"{"items":[]}"#), 0);
        assert_eq!(parse_total_results("<html>"), 0);
    }
}
