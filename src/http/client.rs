use crate::config::Config;
use crate::http::limiter::RateLimiter;
use crate::http::retry::{classify_status, RetryPolicy};
use crate::RequestError;
use reqwest::{redirect::Policy, Client, RequestBuilder};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// A response that passed status classification
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code (2xx or 3xx)
    pub status: u16,
    /// Body as text; invalid UTF-8 is replaced
    pub body: String,
    /// Body bytes after content-encoding was removed
    pub bytes: Vec<u8>,
}

impl FetchedResponse {
    /// Returns true for HTTP 200 exactly
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Builds the pooled HTTP client shared by every component
///
/// gzip and brotli bodies are decoded transparently. Idle connections are
/// pruned after `pool-idle-timeout-secs`. Hosts listed in `http.resolve`
/// bypass DNS.
///
/// # Arguments
///
/// * `config` - The loaded configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let http = &config.http;

    let mut builder = Client::builder();
    for (host, ip) in &http.resolve {
        // Validated at load time; the URL's own port is used
        if let Ok(ip) = ip.parse::<IpAddr>() {
            builder = builder.resolve(host, SocketAddr::new(ip, 0));
        }
    }

    builder
        .user_agent(http.user_agent.clone())
        .timeout(Duration::from_secs(http.request_timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(http.pool_idle_timeout_secs))
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrying, rate-limited HTTP client
///
/// Cloning is cheap; clones share the connection pool, the rate limiter and
/// the connection cap.
#[derive(Debug, Clone)]
pub struct RequestClient {
    client: Client,
    limiter: Arc<RateLimiter>,
    connections: Arc<Semaphore>,
    policy: RetryPolicy,
}

impl RequestClient {
    /// Creates a client with its own rate limiter
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.requests_per_second));
        Self::with_limiter(config, limiter)
    }

    /// Creates a client sharing an existing rate limiter
    pub fn with_limiter(config: &Config, limiter: Arc<RateLimiter>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            limiter,
            connections: Arc::new(Semaphore::new(config.http.max_connections.max(1))),
            policy: RetryPolicy::from_config(&config.retry),
        })
    }

    /// The shared pacing gate
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Executes one logical call with pacing, retries and error classification
    ///
    /// `build` is invoked once per attempt to produce a fresh request.
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 401 | Immediate → `Authentication` |
    /// | HTTP 429 | Immediate → `RateLimited` |
    /// | HTTP 5xx | Retry with backoff → `Service` |
    /// | Timeout | Retry with backoff → `Timeout` |
    /// | Transport error | Retry with backoff → `Network` |
    /// | Other 4xx | Immediate → `Status` |
    pub async fn execute<F>(&self, url: &str, build: F) -> Result<FetchedResponse, RequestError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            self.limiter.acquire().await;

            let result = self.attempt(url, &build).await;
            let error = match result {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if !error.is_retryable() {
                tracing::debug!("Request to {} failed: {}", url, error);
                return Err(error);
            }

            match self.policy.next_delay(attempt, started.elapsed()) {
                Some(delay) => {
                    tracing::warn!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt + 1,
                        url,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    tracing::warn!(
                        "Giving up on {} after {} attempts: {}",
                        url,
                        attempt + 1,
                        error
                    );
                    return Err(error);
                }
            }
        }
    }

    async fn attempt<F>(&self, url: &str, build: &F) -> Result<FetchedResponse, RequestError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|e| RequestError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!("Requesting {}", url);
        let response = build(&self.client)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status().as_u16();
        if let Some(error) = classify_status(url, status) {
            return Err(error);
        }

        let final_url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, e))?
            .to_vec();
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(FetchedResponse {
            final_url,
            status,
            body,
            bytes,
        })
    }

    /// GET a URL
    pub async fn get(&self, url: &str) -> Result<FetchedResponse, RequestError> {
        self.execute(url, |client| client.get(url)).await
    }

    /// GET a URL with query parameters
    pub async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<FetchedResponse, RequestError> {
        self.execute(url, |client| client.get(url).query(query)).await
    }

    /// POST a JSON body with basic authentication
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        login: &str,
        password: &str,
    ) -> Result<FetchedResponse, RequestError> {
        self.execute(url, |client| {
            client
                .post(url)
                .basic_auth(login, Some(password))
                .json(body)
        })
        .await
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> RequestError {
    if error.is_timeout() {
        RequestError::Timeout {
            url: url.to_string(),
        }
    } else {
        RequestError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
