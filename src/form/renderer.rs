//! Rendering collaborator for the step controller

use serde::Serialize;

use super::controller::StepProgress;
use super::validation::ValidationResult;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Message surfaced to the user outside of field annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Presentation side of the form.
///
/// The controller calls these after every state change; implementations own
/// how (or whether) anything is drawn.
pub trait FormRenderer: Send {
    /// Show only the step at `progress.index` and mark reached progress markers
    fn show_step(&mut self, progress: &StepProgress);

    /// Annotate failing fields and clear annotations on passing ones
    fn show_validation(&mut self, result: &ValidationResult);

    /// Toggle the busy indicator on the submit control
    fn show_busy(&mut self, busy: bool);

    fn notify(&mut self, notification: &Notification);
}

/// Renderer that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl FormRenderer for NullRenderer {
    fn show_step(&mut self, _progress: &StepProgress) {}

    fn show_validation(&mut self, _result: &ValidationResult) {}

    fn show_busy(&mut self, _busy: bool) {}

    fn notify(&mut self, _notification: &Notification) {}
}

/// Renderer that reports every change as a tracing event.
///
/// Used by the CLI, where the form runs headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl FormRenderer for LogRenderer {
    fn show_step(&mut self, progress: &StepProgress) {
        tracing::info!(
            step = progress.index + 1,
            total = progress.total,
            "Showing step"
        );
    }

    fn show_validation(&mut self, result: &ValidationResult) {
        for error in result.errors() {
            tracing::warn!(field = %error.field, "{}", error.message);
        }
        if !result.passed().is_empty() {
            tracing::debug!(fields = ?result.passed(), "Fields passed validation");
        }
    }

    fn show_busy(&mut self, busy: bool) {
        if busy {
            tracing::info!("Processing...");
        }
    }

    fn notify(&mut self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Success => tracing::info!("{}", notification.message),
            NotificationLevel::Error => tracing::error!("{}", notification.message),
        }
    }
}
