//! Batch execution
//!
//! # Components
//!
//! - `CheckpointStore`: durable `last_processed_index` marker
//! - `SitePipeline`: classify → enrich for one record
//! - `BatchScheduler`: chunked, checkpointed run over all records
//! - `JobHandle` / `JobEvent`: progress and terminal events for a front-end

mod checkpoint;
mod job;
mod pipeline;
mod scheduler;

pub use checkpoint::{CheckpointState, CheckpointStore};
pub use job::{submit_batch, JobEvent, JobHandle};
pub use pipeline::{PipelineOutput, SitePipeline};
pub use scheduler::{BatchScheduler, RunSummary};
