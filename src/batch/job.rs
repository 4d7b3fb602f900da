use crate::batch::scheduler::{BatchScheduler, RunSummary};
use crate::model::{JobState, ProcessingOutcome, SiteRecord};
use crate::ScoutError;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Events emitted by a running batch
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// A chunk finished; `processed` counts records from the start of the input
    Progress {
        percent: f64,
        processed: usize,
        total: usize,
    },
    /// Human-readable message for one failed record or a fatal condition
    Error { message: String },
    /// The run reached a terminal state; carries every stored outcome
    Finished {
        state: JobState,
        outcomes: Vec<ProcessingOutcome>,
    },
}

/// Handle to a batch running on the tokio runtime
pub struct JobHandle {
    events: UnboundedReceiver<JobEvent>,
    cancel: CancellationToken,
    join: JoinHandle<Result<RunSummary, ScoutError>>,
}

impl JobHandle {
    /// Requests cooperative cancellation
    ///
    /// Takes effect before the next chunk starts; records already in flight
    /// finish normally.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this job, for signal handlers
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receives the next event; None once the job has finished and all events are read
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Waits for the job to end
    pub async fn wait(self) -> Result<RunSummary, ScoutError> {
        self.join
            .await
            .map_err(|e| ScoutError::Task(e.to_string()))?
    }
}

/// Starts a batch in the background and returns its handle
pub fn submit_batch(mut scheduler: BatchScheduler, records: Vec<SiteRecord>) -> JobHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let join = tokio::spawn(async move { scheduler.run(records, token, &tx).await });

    JobHandle {
        events: rx,
        cancel,
        join,
    }
}
