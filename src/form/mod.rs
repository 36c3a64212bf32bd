//! Multi-step registration form
//!
//! A [`StepController`] walks the user through the steps of a [`FormSchema`],
//! validating each step before it advances and running a cancellable
//! submission once the final step passes. Rendering and submission are
//! injected collaborators ([`FormRenderer`], [`SubmissionSink`]) so the whole
//! flow runs without a display.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod controller;
pub mod renderer;
pub mod schema;
pub mod submission;
pub mod validation;


pub use controller::{StepController, StepProgress};
pub use renderer::{FormRenderer, LogRenderer, Notification, NotificationLevel, NullRenderer};
pub use schema::{FieldKind, FieldSchema, FormSchema, StepSchema};
pub use submission::{
    SimulatedSubmission, SubmissionOutcome, SubmissionPhase, SubmissionReceipt, SubmissionSink,
};
pub use validation::{validate_field, validate_step, FieldError, FieldIssue, ValidationResult};

/// Errors raised by form definitions and controller misuse.
///
/// Invalid user input is never a `FormError`; it is reported through
/// [`ValidationResult`].
#[derive(Error, Debug)]
pub enum FormError {
    #[error("form has no steps")]
    EmptyForm,

    #[error("step '{0}' is defined more than once")]
    DuplicateStep(String),

    #[error("field '{0}' is defined more than once")]
    DuplicateField(String),

    #[error("invalid form definition: {0}")]
    InvalidDefinition(String),

    #[error("step index {index} is out of range (form has {len} steps)")]
    StepOutOfRange { index: usize, len: usize },

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("step {current} is not the final step ({last})")]
    NotOnFinalStep { current: usize, last: usize },

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("submission requires a running tokio runtime")]
    NoRuntime,
}

/// Current field values, keyed by field id.
///
/// Fields that were never set read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field, empty when unset
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map_or("", String::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of fields holding a non-empty value
    pub fn filled_count(&self) -> usize {
        self.0.values().filter(|v| !v.is_empty()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(String::is_empty)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
