use crate::config::RetryConfig;
use crate::RequestError;
use std::time::Duration;

/// Exponential backoff settings for one logical call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub max_elapsed: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_elapsed: Duration::from_secs(config.max_elapsed_secs),
        }
    }

    /// Delay before retry number `attempt` (0 for the first retry)
    ///
    /// `min(initial_delay * multiplier^attempt, max_delay)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let max = self.max_delay.as_millis() as f64;

        if !millis.is_finite() || millis >= max {
            self.max_delay
        } else {
            Duration::from_millis(millis as u64)
        }
    }

    /// Returns the delay to wait before retrying, or None once retries are exhausted
    ///
    /// # Arguments
    ///
    /// * `attempt` - Zero-based retry number about to be made
    /// * `elapsed` - Time already spent on this call
    pub fn next_delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let delay = self.delay_for(attempt);
        if elapsed + delay > self.max_elapsed {
            return None;
        }

        Some(delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Maps a non-success HTTP status to a request error
///
/// Returns None for 2xx and 3xx statuses.
///
/// | Status | Error | Retried |
/// |--------|-------|---------|
/// | 401 | `Authentication` | no |
/// | 429 | `RateLimited` | no |
/// | 5xx | `Service` | yes |
/// | other 4xx | `Status` | no |
pub fn classify_status(url: &str, status: u16) -> Option<RequestError> {
    let url = url.to_string();
    match status {
        401 => Some(RequestError::Authentication { url }),
        429 => Some(RequestError::RateLimited { url }),
        500..=599 => Some(RequestError::Service { url, status }),
        400..=499 => Some(RequestError::Status { url, status }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(2000),
            multiplier: 2.0,
            max_delay: Duration::from_millis(15_000),
            max_elapsed: Duration::from_secs(90),
        }
    }

    #[test]
    fn test_delays_grow_until_capped() {
        let policy = policy();
        assert_eq!(policy.delay_for(0), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(8000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(15_000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(15_000));
    }

    #[test]
    fn test_retries_exhaust() {
        let policy = policy();
        assert!(policy.next_delay(0, Duration::ZERO).is_some());
        assert!(policy.next_delay(2, Duration::ZERO).is_some());
        assert!(policy.next_delay(3, Duration::ZERO).is_none());
    }

    #[test]
    fn test_wall_clock_ceiling() {
        let policy = policy();
        assert!(policy.next_delay(2, Duration::from_secs(85)).is_none());
        assert!(policy.next_delay(2, Duration::from_secs(80)).is_some());
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status("u", 200).is_none());
        assert!(classify_status("u", 301).is_none());
        assert!(matches!(
            classify_status("u", 401),
            Some(RequestError::Authentication { .. })
        ));
        assert!(matches!(
            classify_status("u", 429),
            Some(RequestError::RateLimited { .. })
        ));
        assert!(matches!(
            classify_status("u", 503),
            Some(RequestError::Service { status: 503, .. })
        ));
        assert!(matches!(
            classify_status("u", 404),
            Some(RequestError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_retryable_classes() {
        assert!(classify_status("u", 500).unwrap().is_retryable());
        assert!(!classify_status("u", 401).unwrap().is_retryable());
        assert!(!classify_status("u", 429).unwrap().is_retryable());
        assert!(!classify_status("u", 403).unwrap().is_retryable());
        assert!(classify_status("u", 401).unwrap().is_fatal());
    }
}
