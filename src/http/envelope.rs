use serde::de::DeserializeOwned;
use serde_json::Value;

/// Task status code the ranking provider uses for success
pub const SUCCESS_CODE: i64 = 20000;

/// Typed task envelope returned by the ranking/backlink provider
///
/// The wire shape is `{"tasks": [{"status_code": 20000, "status_message": "Ok.", "result": [...]}]}`.
/// Only the first task is read.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiEnvelope<T> {
    Success { data: Vec<T> },
    Failure { code: i64, message: String },
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Parses a response body
    ///
    /// Returns `Err` with a description when the body is not a well-formed
    /// envelope: an object with a non-empty `tasks` array whose first
    /// element has a numeric `status_code`. Result items that are null or
    /// do not match `T` are skipped.
    pub fn parse(body: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| format!("invalid JSON: {}", e))?;

        let task = value
            .get("tasks")
            .and_then(Value::as_array)
            .and_then(|tasks| tasks.first())
            .ok_or_else(|| "missing or empty tasks array".to_string())?;

        let code = task
            .get("status_code")
            .and_then(Value::as_i64)
            .ok_or_else(|| "task has no numeric status_code".to_string())?;

        if code != SUCCESS_CODE {
            let message = task
                .get("status_message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Ok(Self::Failure { code, message });
        }

        let data = match task.get("result") {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| !item.is_null())
                .filter_map(|item| serde_json::from_value::<T>(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self::Success { data })
    }
}

/// Decodes a provider response into its result items
///
/// Failures and malformed envelopes are logged and yield an empty list so
/// callers can continue with partial data.
pub fn decode_task_results<T: DeserializeOwned>(url: &str, body: &str) -> Vec<T> {
    match ApiEnvelope::<T>::parse(body) {
        Ok(ApiEnvelope::Success { data }) => data,
        Ok(ApiEnvelope::Failure { code, message }) => {
            tracing::warn!("API task failed for {}: {} ({})", url, message, code);
            Vec::new()
        }
        Err(reason) => {
            tracing::warn!("Malformed API response from {}: {}", url, reason);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        rank: i64,
    }

    #[test]
    fn test_success() {
        let body = r#"{"tasks":[{"status_code":20000,"result":[{"rank":7},null,{"rank":9}]}]}"#;
        let envelope = ApiEnvelope::<Item>::parse(body).unwrap();
        assert_eq!(
            envelope,
            ApiEnvelope::Success {
                data: vec![Item { rank: 7 }, Item { rank: 9 }]
            }
        );
    }

    #[test]
    fn test_null_result_is_empty_success() {
        let body = r#"{"tasks":[{"status_code":20000,"result":null}]}"#;
        let envelope = ApiEnvelope::<Item>::parse(body).unwrap();
        assert_eq!(envelope, ApiEnvelope::Success { data: vec![] });
    }

    #[test]
    fn test_failure_code() {
        let body = r#"{"tasks":[{"status_code":40501,"status_message":"Invalid Field"}]}"#;
        let envelope = ApiEnvelope::<Item>::parse(body).unwrap();
        assert_eq!(
            envelope,
            ApiEnvelope::Failure {
                code: 40501,
                message: "Invalid Field".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_shapes() {
        assert!(ApiEnvelope::<Item>::parse("not json").is_err());
        assert!(ApiEnvelope::<Item>::parse("[]").is_err());
        assert!(ApiEnvelope::<Item>::parse(r#"{"tasks":[]}"#).is_err());
        assert!(ApiEnvelope::<Item>::parse(r#"{"tasks":[{"status_code":"20000"}]}"#).is_err());
    }

    #[test]
    fn test_decode_defaults_to_empty() {
        let items: Vec<Item> = decode_task_results("u", r#"{"tasks":"nope"}"#);
        assert!(items.is_empty());

        let items: Vec<Item> =
            decode_task_results("u", r#"{"tasks":[{"status_code":50000,"result":[{"rank":1}]}]}"#);
        assert!(items.is_empty());
    }
}
