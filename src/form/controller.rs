//! Step controller for the multi-step form

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::renderer::{FormRenderer, Notification};
use super::schema::FormSchema;
use super::submission::{
    PendingSubmission, SubmissionOutcome, SubmissionPhase, SubmissionReceipt, SubmissionSink,
};
use super::validation::{validate_step, ValidationResult};
use super::{FormData, FormError};

/// Message shown once a registration has been accepted
pub const SUBMITTED_MESSAGE: &str =
    "Registration submitted successfully! You will receive a confirmation email shortly.";

/// Where the user is in the form, for progress indicators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    /// Index of the active step
    pub index: usize,
    pub total: usize,
    /// One marker per step; `true` for every step up to and including the active one
    pub reached: Vec<bool>,
}

impl StepProgress {
    fn at(index: usize, total: usize) -> Self {
        Self {
            index,
            total,
            reached: (0..total).map(|i| i <= index).collect(),
        }
    }
}

/// Drives a [`FormSchema`] one step at a time.
///
/// Holds the active step index (always within `0..schema.len()`), the field
/// values and the submission phase. Every state change is pushed to the
/// injected [`FormRenderer`].
pub struct StepController {
    schema: FormSchema,
    current: usize,
    values: FormData,
    phase: SubmissionPhase,
    renderer: Box<dyn FormRenderer>,
    sink: Arc<dyn SubmissionSink>,
    pending: Option<PendingSubmission>,
    submission_seq: u64,
}

impl StepController {
    /// Create a controller positioned on the first step
    pub fn new(
        schema: FormSchema,
        sink: Arc<dyn SubmissionSink>,
        mut renderer: Box<dyn FormRenderer>,
    ) -> Self {
        debug_assert!(!schema.is_empty());
        renderer.show_step(&StepProgress::at(0, schema.len()));
        Self {
            schema,
            current: 0,
            values: FormData::new(),
            phase: SubmissionPhase::Idle,
            renderer,
            sink,
            pending: None,
            submission_seq: 0,
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn is_final_step(&self) -> bool {
        self.current + 1 == self.schema.len()
    }

    pub fn progress(&self) -> StepProgress {
        StepProgress::at(self.current, self.schema.len())
    }

    pub fn phase(&self) -> &SubmissionPhase {
        &self.phase
    }

    pub fn values(&self) -> &FormData {
        &self.values
    }

    /// Current value of a field, empty when unset
    pub fn value(&self, field: &str) -> Result<&str, FormError> {
        if self.schema.field(field).is_none() {
            return Err(FormError::UnknownField(field.to_string()));
        }
        Ok(self.values.get(field))
    }

    /// Set a field value; fields on any step may be edited until a
    /// submission is under way
    pub fn set_value(&mut self, field: &str, value: impl Into<String>) -> Result<(), FormError> {
        self.ensure_not_submitting()?;
        if self.schema.field(field).is_none() {
            return Err(FormError::UnknownField(field.to_string()));
        }
        self.values.set(field, value);
        Ok(())
    }

    /// Validate the active step without rendering anything
    pub fn validate_current(&self) -> Result<ValidationResult, FormError> {
        validate_step(&self.schema, self.current, &self.values)
    }

    fn ensure_not_submitting(&self) -> Result<(), FormError> {
        if self.phase.is_submitting() {
            return Err(FormError::SubmissionInProgress);
        }
        Ok(())
    }

    fn show(&mut self, index: usize) {
        self.current = index;
        let progress = self.progress();
        self.renderer.show_step(&progress);
    }

    /// Validate the active step and advance if it passes.
    ///
    /// On the final step a passing result leaves the index where it is. On
    /// failure the index is unchanged and the errors are rendered. Navigation
    /// is locked while a submission is pending.
    #[instrument(skip(self), fields(step = self.current))]
    pub fn go_next(&mut self) -> Result<ValidationResult, FormError> {
        self.ensure_not_submitting()?;
        let result = self.validate_current()?;
        self.renderer.show_validation(&result);

        if !result.is_valid() {
            debug!(errors = result.errors().len(), "Step failed validation");
            return Ok(result);
        }

        if !self.is_final_step() {
            self.show(self.current + 1);
            debug!(step = self.current, "Advanced");
        }
        Ok(result)
    }

    /// Move back one step. Never validates. Returns whether the index moved.
    pub fn go_prev(&mut self) -> Result<bool, FormError> {
        self.ensure_not_submitting()?;
        if self.current == 0 {
            return Ok(false);
        }
        self.show(self.current - 1);
        Ok(true)
    }

    /// Validate the final step and start submitting.
    ///
    /// Returns the validation result; when it passed, the controller is now in
    /// [`SubmissionPhase::Submitting`] and the sink runs on a tokio task.
    /// Outside a tokio runtime this fails with [`FormError::NoRuntime`] and
    /// nothing changes.
    #[instrument(skip(self), fields(step = self.current))]
    pub fn submit(&mut self) -> Result<ValidationResult, FormError> {
        self.ensure_not_submitting()?;
        if !self.is_final_step() {
            return Err(FormError::NotOnFinalStep {
                current: self.current,
                last: self.schema.len() - 1,
            });
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(FormError::NoRuntime);
        }

        let result = self.validate_current()?;
        self.renderer.show_validation(&result);
        if !result.is_valid() {
            debug!(errors = result.errors().len(), "Final step failed validation");
            return Ok(result);
        }

        self.submission_seq = self.submission_seq.saturating_add(1);
        let id = self.submission_seq;
        info!(
            submission = id,
            sink = %self.sink.name(),
            fields = self.values.filled_count(),
            "Submitting registration"
        );

        self.pending = Some(PendingSubmission::spawn(
            id,
            self.sink.clone(),
            self.values.clone(),
        ));
        self.phase = SubmissionPhase::Submitting { id };
        self.renderer.show_busy(true);

        Ok(result)
    }

    /// Wait for the pending submission and apply its outcome.
    ///
    /// Returns `None` when nothing is pending.
    pub async fn wait_for_submission(&mut self) -> Option<SubmissionOutcome> {
        let pending = self.pending.as_mut()?;
        let result = pending.finished().await;
        Some(self.finish(result))
    }

    /// Apply the pending submission's outcome if it has finished
    pub fn poll_submission(&mut self) -> Option<SubmissionOutcome> {
        let result = self.pending.as_mut()?.try_finished()?;
        Some(self.finish(result))
    }

    /// Abandon the pending submission.
    ///
    /// Values and the active step are kept. Returns whether anything was pending.
    pub fn cancel_submission(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        info!(submission = pending.id, "Cancelling submission");
        pending.cancel();
        self.phase = SubmissionPhase::Idle;
        self.renderer.show_busy(false);
        true
    }

    fn finish(&mut self, result: anyhow::Result<SubmissionReceipt>) -> SubmissionOutcome {
        let id = self.pending.take().map_or(0, |p| p.id);
        self.renderer.show_busy(false);

        match result {
            Ok(receipt) => {
                info!(
                    submission = id,
                    reference = %receipt.reference,
                    "Registration submitted"
                );
                self.renderer.notify(&Notification::success(SUBMITTED_MESSAGE));
                self.values.clear();
                self.show(0);
                self.phase = SubmissionPhase::Submitted(receipt.clone());
                SubmissionOutcome::Submitted(receipt)
            }
            Err(e) => {
                warn!(submission = id, error = %e, "Submission failed");
                let message = format!("Submission failed: {e}");
                self.renderer.notify(&Notification::error(&message));
                self.phase = SubmissionPhase::Idle;
                SubmissionOutcome::Failed(message)
            }
        }
    }
}

impl std::fmt::Debug for StepController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepController")
            .field("form", &self.schema.name)
            .field("current", &self.current)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
