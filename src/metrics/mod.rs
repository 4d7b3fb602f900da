//! Enrichment metrics for detected sites
//!
//! [`MetricsFetcher`] queries domain rank, backlink totals and the indexed
//! page count. Backlink lookups are metered, so each domain is billed at
//! most once per run.

mod fetcher;

pub use fetcher::{MetricsFetcher, MetricsReport};
