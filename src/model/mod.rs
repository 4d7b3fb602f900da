//! Data model for CMS-Scout
//!
//! # Components
//!
//! - `SiteRecord`: One validated input row
//! - `CmsLabel` / `ConfidenceSignal`: Verdict of the classification engine and which heuristic produced it
//! - `ClassificationResult`, `SiteMetrics`, `ProcessingOutcome`: Per-record results written to the recovery store
//! - `JobState`: Lifecycle of a batch run

mod job;
mod label;
mod outcome;
mod record;

// Re-export main types
pub use job::JobState;
pub use label::{CmsLabel, ConfidenceSignal};
pub use outcome::{ClassificationResult, OutcomeStatus, ProcessingOutcome, SiteMetrics};
pub use record::SiteRecord;
