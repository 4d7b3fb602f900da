use super::ProviderApi;
use crate::http::decode_task_results;
use crate::RequestError;
use serde::Deserialize;
use serde_json::Value;

const TECHNOLOGIES_PATH: &str = "domain_analytics/technologies/domain_technologies/live";

#[derive(Debug, Deserialize)]
struct TechnologyItem {
    #[serde(default)]
    domain_rank: Option<i64>,
    #[serde(default)]
    technologies: Value,
}

/// What the technology endpoint knows about a domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechnologyReport {
    /// Every technology name, flattened out of the group/category tree
    pub technologies: Vec<String>,
    /// Names listed under the CMS category
    pub cms: Vec<String>,
    pub domain_rank: Option<i64>,
}

impl TechnologyReport {
    /// Returns the first technology whose name contains `platform`, case-insensitively
    pub fn find_platform(&self, platform: &str) -> Option<&str> {
        let needle = platform.to_lowercase();
        self.technologies
            .iter()
            .find(|name| name.to_lowercase().contains(&needle))
            .map(String::as_str)
    }

    fn from_item(item: TechnologyItem) -> Self {
        let cms_node = item
            .technologies
            .get("cms")
            .or_else(|| item.technologies.get("content").and_then(|c| c.get("cms")));

        let mut cms = Vec::new();
        if let Some(node) = cms_node {
            flatten_into(node, &mut cms);
        }

        Self {
            technologies: flatten_technologies(&item.technologies),
            cms,
            domain_rank: item.domain_rank,
        }
    }
}

/// Flattens a nested technology object into a list of names
///
/// The provider groups names as `{group: {category: [names]}}`, but older
/// responses put categories at the top level. Any depth is accepted.
pub fn flatten_technologies(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    flatten_into(value, &mut names);
    names
}

fn flatten_into(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::String(name) => {
            if !name.is_empty() && !names.contains(name) {
                names.push(name.clone());
            }
        }
        Value::Array(items) => items.iter().for_each(|item| flatten_into(item, names)),
        Value::Object(map) => map.values().for_each(|item| flatten_into(item, names)),
        _ => {}
    }
}

impl ProviderApi {
    /// Looks up technologies and domain rank for a domain
    ///
    /// An empty or malformed response yields an empty report.
    pub async fn technologies(&self, domain: &str) -> Result<TechnologyReport, RequestError> {
        let (url, body) = self.post_task(TECHNOLOGIES_PATH, domain).await?;
        let items: Vec<TechnologyItem> = decode_task_results(&url, &body);

        Ok(items
            .into_iter()
            .next()
            .map(TechnologyReport::from_item)
            .unwrap_or_default())
    }
}
