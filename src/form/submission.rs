//! Submission collaborator and the cancellable pending submission

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::FormData;

/// Confirmation returned by a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    /// Registration reference number (e.g., REG-1A2B3C4D)
    pub reference: String,
    pub submitted_at: DateTime<Utc>,
    /// Number of non-empty fields that were submitted
    pub field_count: usize,
}

impl SubmissionReceipt {
    pub fn for_data(data: &FormData) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            reference: format!("REG-{}", id[..8].to_uppercase()),
            submitted_at: Utc::now(),
            field_count: data.filled_count(),
        }
    }
}

/// Where validated form data goes.
///
/// The controller hands over the data once the final step passes; timing and
/// transport are the sink's concern.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Sink name (for logging)
    fn name(&self) -> &str;

    async fn submit(&self, data: &FormData) -> Result<SubmissionReceipt>;
}

/// Stand-in for a network round trip: waits a fixed delay, then succeeds
#[derive(Debug, Clone)]
pub struct SimulatedSubmission {
    delay: Duration,
}

impl SimulatedSubmission {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedSubmission {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl SubmissionSink for SimulatedSubmission {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn submit(&self, data: &FormData) -> Result<SubmissionReceipt> {
        tokio::time::sleep(self.delay).await;
        Ok(SubmissionReceipt::for_data(data))
    }
}

/// Where the controller stands with respect to submission
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    /// A submission task is running
    Submitting { id: u64 },
    /// The last submission succeeded; the form has been reset
    Submitted(SubmissionReceipt),
}

impl SubmissionPhase {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionPhase::Submitting { .. })
    }
}

/// How a pending submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Submitted(SubmissionReceipt),
    Failed(String),
}

/// A running submission task.
///
/// Cancelled by [`PendingSubmission::cancel`] or by dropping it; either way the
/// completion receiver goes away with the handle, so a late result can never be
/// applied.
pub(crate) struct PendingSubmission {
    pub(crate) id: u64,
    cancel_tx: Option<oneshot::Sender<()>>,
    done_rx: oneshot::Receiver<Result<SubmissionReceipt>>,
    task_handle: JoinHandle<()>,
}

impl PendingSubmission {
    /// Spawn the sink on the current tokio runtime
    pub(crate) fn spawn(id: u64, sink: Arc<dyn SubmissionSink>, data: FormData) -> Self {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel();

        let task_handle = tokio::spawn(async move {
            tokio::select! {
                result = sink.submit(&data) => {
                    if done_tx.send(result).is_err() {
                        tracing::debug!(submission = id, "Submission finished after its handle was dropped");
                    }
                }
                _ = cancel_rx => {
                    tracing::debug!(submission = id, sink = %sink.name(), "Submission cancelled");
                }
            }
        });

        Self {
            id,
            cancel_tx: Some(cancel_tx),
            done_rx,
            task_handle,
        }
    }

    /// Wait for the task to report
    pub(crate) async fn finished(&mut self) -> Result<SubmissionReceipt> {
        match (&mut self.done_rx).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("submission task ended without a result")),
        }
    }

    /// Non-blocking check; `None` while the task is still running
    pub(crate) fn try_finished(&mut self) -> Option<Result<SubmissionReceipt>> {
        match self.done_rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(anyhow::anyhow!(
                "submission task ended without a result"
            ))),
        }
    }

    pub(crate) fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}
