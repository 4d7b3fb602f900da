use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Global request pacing gate
///
/// Grants are strictly serialized: the mutex guarding the last grant is held
/// while a caller sleeps, so the next caller measures its interval from the
/// previous grant rather than from when it started waiting.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` grants per second
    ///
    /// Non-positive or non-finite rates disable pacing; validated
    /// configuration never produces one.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second > 0.0 && requests_per_second.is_finite() {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };

        Self {
            interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Minimum spacing between two grants
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the caller may issue its request
    pub async fn acquire(&self) {
        let mut last = self.last_grant.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(1.0);
        let start = std::time::Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_consecutive_acquires_are_spaced() {
        let limiter = RateLimiter::new(1.0);
        let start = std::time::Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(20.0));
        let start = std::time::Instant::now();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // 5 grants need at least 4 intervals of 50ms
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_invalid_rate_disables_pacing() {
        assert_eq!(RateLimiter::new(0.0).interval(), Duration::ZERO);
        assert_eq!(RateLimiter::new(f64::NAN).interval(), Duration::ZERO);
        assert_eq!(RateLimiter::new(4.0).interval(), Duration::from_millis(250));
    }
}
