use crate::api::ProviderApi;
use crate::batch::checkpoint::CheckpointStore;
use crate::batch::job::JobEvent;
use crate::batch::pipeline::{PipelineOutput, SitePipeline};
use crate::config::Config;
use crate::detect::ClassificationEngine;
use crate::http::RequestClient;
use crate::metrics::MetricsFetcher;
use crate::model::{JobState, OutcomeStatus, ProcessingOutcome, SiteRecord};
use crate::output::write_partitions;
use crate::sitemap::SitemapCrawler;
use crate::storage::{SqliteStorage, Storage};
use crate::{RequestError, ScoutError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Totals of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub state: JobState,
    pub run_id: i64,
    /// First record this run processed
    pub resumed_from: usize,
    /// Records processed by this run
    pub processed: usize,
    pub total: usize,
}

/// What one chunk produced
struct ChunkResult {
    outcomes: Vec<ProcessingOutcome>,
    rate_limited: bool,
    fatal: Option<RequestError>,
}

/// Chunked, checkpointed batch runner
///
/// # State Machine
///
/// ```text
/// Idle -> Running -> Completed   all chunks done, output partitioned
///                 -> Cancelled   stop requested before a chunk started
///                 -> Failed      checkpoint/store failure or rejected credentials
/// ```
///
/// Records of one chunk run concurrently, bounded by `max-concurrent`. The
/// checkpoint only advances once the whole chunk has resolved, so an
/// interrupted chunk is recomputed from its first record on resume.
pub struct BatchScheduler {
    config: Arc<Config>,
    pipeline: Arc<SitePipeline>,
    storage: SqliteStorage,
    checkpoint: CheckpointStore,
    config_hash: String,
    state: JobState,
}

impl BatchScheduler {
    /// Builds the scheduler and every component it drives
    ///
    /// All components share one HTTP client, and therefore one rate limiter
    /// and one connection cap.
    pub fn new(
        config: Arc<Config>,
        storage: SqliteStorage,
        config_hash: impl Into<String>,
    ) -> Result<Self, ScoutError> {
        let client = RequestClient::new(&config)?;
        let api = ProviderApi::new(client.clone(), config.api.clone());
        let engine = ClassificationEngine::new(Arc::clone(&config), client.clone(), api.clone())?;
        let crawler = SitemapCrawler::new(Arc::clone(&config), client);
        let metrics = MetricsFetcher::new(api);
        let pipeline = SitePipeline::new(Arc::clone(&config), engine, crawler, metrics);

        Ok(Self {
            checkpoint: CheckpointStore::new(&config.output.checkpoint_path),
            config,
            pipeline: Arc::new(pipeline),
            storage,
            config_hash: config_hash.into(),
            state: JobState::Idle,
        })
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    fn transition(&mut self, next: JobState) -> Result<(), ScoutError> {
        if !self.state.can_transition_to(next) {
            return Err(ScoutError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Job state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the batch to a terminal state
    ///
    /// Emits `Progress` after every chunk, `Error` for each failed record or
    /// fatal condition, and exactly one `Finished`. Returns `Err` only for
    /// scheduler-level failures; the run is then `Failed`.
    pub async fn run(
        &mut self,
        records: Vec<SiteRecord>,
        cancel: CancellationToken,
        events: &UnboundedSender<JobEvent>,
    ) -> Result<RunSummary, ScoutError> {
        self.transition(JobState::Running)?;

        let result = match self.run_chunks(&records, &cancel, events).await {
            Ok(summary) => match self.finish(&summary) {
                Ok(outcomes) => Ok((summary, outcomes)),
                Err(e) => Err((Some(summary.run_id), e)),
            },
            Err(failure) => Err(failure),
        };

        match result {
            Ok((summary, outcomes)) => {
                let _ = events.send(JobEvent::Finished {
                    state: summary.state,
                    outcomes,
                });
                Ok(summary)
            }
            Err((run_id, e)) => {
                tracing::error!("Batch failed: {}", e);
                if let Err(state_error) = self.transition(JobState::Failed) {
                    tracing::debug!("{}", state_error);
                }
                if let Some(run_id) = run_id {
                    if let Err(store_error) = self.storage.finish_run(run_id, JobState::Failed) {
                        tracing::warn!("Could not mark run {} failed: {}", run_id, store_error);
                    }
                }
                let _ = events.send(JobEvent::Error {
                    message: e.to_string(),
                });
                let outcomes = self.storage.load_outcomes().unwrap_or_else(|load_error| {
                    tracing::warn!("Could not load stored outcomes: {}", load_error);
                    Vec::new()
                });
                let _ = events.send(JobEvent::Finished {
                    state: JobState::Failed,
                    outcomes,
                });
                Err(e)
            }
        }
    }

    /// Processes chunks until done, cancelled or stopped by a fatal error
    ///
    /// On error, returns the run id (if one was created) alongside the error.
    async fn run_chunks(
        &mut self,
        records: &[SiteRecord],
        cancel: &CancellationToken,
        events: &UnboundedSender<JobEvent>,
    ) -> Result<RunSummary, (Option<i64>, ScoutError)> {
        let total = records.len();
        let chunk_size = self.config.batch.chunk_size.max(1);

        let mut start = self.checkpoint.load().map_err(|e| (None, e))?;
        if start >= total {
            if start > 0 {
                tracing::info!(
                    "Checkpoint {} is past the end of {} records, starting fresh",
                    start,
                    total
                );
            }
            start = 0;
        }
        if start == 0 {
            self.storage
                .clear_outcomes()
                .map_err(|e| (None, ScoutError::from(e)))?;
        } else {
            tracing::info!("Resuming at record {} of {}", start, total);
        }

        let run_id = self
            .storage
            .create_run(&self.config_hash, start)
            .map_err(|e| (None, ScoutError::from(e)))?;
        let fail = |e: ScoutError| (Some(run_id), e);

        let mut processed_to = start;
        let mut chunk_start = start;
        let mut terminal = JobState::Completed;

        while chunk_start < total {
            if cancel.is_cancelled() {
                tracing::info!("Stop requested, cancelling before record {}", chunk_start);
                terminal = JobState::Cancelled;
                break;
            }

            let chunk_end = (chunk_start + chunk_size).min(total);
            tracing::info!("Processing records {}..{} of {}", chunk_start, chunk_end, total);

            let chunk = Self::run_chunk(
                Arc::clone(&self.pipeline),
                self.config.batch.max_concurrent,
                &records[chunk_start..chunk_end],
            )
            .await;

            for outcome in chunk.outcomes.iter().filter(|o| o.status == OutcomeStatus::Failed) {
                let _ = events.send(JobEvent::Error {
                    message: format!(
                        "{}: {}",
                        outcome.record.domain,
                        outcome.error_detail.as_deref().unwrap_or("failed")
                    ),
                });
            }

            self.storage
                .upsert_outcomes(run_id, &chunk.outcomes)
                .map_err(|e| fail(e.into()))?;

            if let Some(fatal) = chunk.fatal {
                return Err(fail(ScoutError::Request(fatal)));
            }

            self.checkpoint.save(chunk_end).map_err(fail)?;
            processed_to = chunk_end;

            let percent = (processed_to as f64 / total as f64 * 100.0).min(100.0);
            let _ = events.send(JobEvent::Progress {
                percent,
                processed: processed_to,
                total,
            });

            chunk_start = chunk_end;
            if chunk_start < total {
                let cooldown = if chunk.rate_limited {
                    tracing::warn!("Provider throttling seen, cooling down");
                    self.config.batch.rate_limit_cooldown_ms
                } else {
                    self.config.batch.chunk_cooldown_ms
                };
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(cooldown)) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        Ok(RunSummary {
            state: terminal,
            run_id,
            resumed_from: start,
            processed: processed_to - start,
            total,
        })
    }

    /// Runs one chunk's records under the concurrency gate
    ///
    /// Takes no `&self`: the store connection is not `Sync` and must not be
    /// borrowed across the awaits below.
    async fn run_chunk(
        pipeline: Arc<SitePipeline>,
        max_concurrent: usize,
        records: &[SiteRecord],
    ) -> ChunkResult {
        let gate = Arc::new(Semaphore::new(max_concurrent.max(1)));

        let handles: Vec<_> = records
            .iter()
            .cloned()
            .map(|record| {
                let gate = Arc::clone(&gate);
                let pipeline = Arc::clone(&pipeline);
                let fallback = record.clone();
                let handle = tokio::spawn(async move {
                    let _permit = gate.acquire_owned().await.ok();
                    pipeline.process(record).await
                });
                (fallback, handle)
            })
            .collect();

        let mut result = ChunkResult {
            outcomes: Vec::with_capacity(handles.len()),
            rate_limited: false,
            fatal: None,
        };

        for (record, handle) in handles {
            let output = match handle.await {
                Ok(output) => output,
                Err(e) => {
                    tracing::error!("Task for row {} did not complete: {}", record.index, e);
                    PipelineOutput {
                        outcome: ProcessingOutcome::failed(record, format!("task failed: {}", e)),
                        rate_limited: false,
                        fatal: None,
                    }
                }
            };

            result.rate_limited |= output.rate_limited;
            if result.fatal.is_none() {
                result.fatal = output.fatal;
            }
            result.outcomes.push(output.outcome);
        }

        result
    }

    /// Writes the partitions of a completed run, then records the terminal state
    ///
    /// The run only counts as `Completed` once its output is on disk; any
    /// error here fails the run instead.
    fn finish(&mut self, summary: &RunSummary) -> Result<Vec<ProcessingOutcome>, ScoutError> {
        let outcomes = self.storage.load_outcomes()?;

        if summary.state == JobState::Completed {
            let written = write_partitions(Path::new(&self.config.output.output_dir), &outcomes)?;
            tracing::info!(
                "Wrote {} outcomes to {} files in {}",
                outcomes.len(),
                written.len(),
                self.config.output.output_dir
            );
        }

        self.storage.finish_run(summary.run_id, summary.state)?;
        self.transition(summary.state)?;

        Ok(outcomes)
    }
}
