//! Outbound HTTP for CMS-Scout
//!
//! Every request the pipeline makes, whether to a target website or to a
//! metered API, goes through [`RequestClient`]. The client composes three
//! controls:
//!
//! - `RateLimiter`: one global pacing gate shared by all calls
//! - `RetryPolicy`: exponential backoff for transient failures
//! - a connection cap on concurrently open requests
//!
//! API responses are decoded through [`ApiEnvelope`], which turns malformed
//! or failed task envelopes into an empty result instead of an error.

mod client;
mod envelope;
mod limiter;
mod retry;

// Re-export main types
pub use client::{build_http_client, FetchedResponse, RequestClient};
pub use envelope::{decode_task_results, ApiEnvelope, SUCCESS_CODE};
pub use limiter::RateLimiter;
pub use retry::{classify_status, RetryPolicy};
