//! Registration Flow Integration Tests
//!
//! Drives the built-in land registration form end to end through the public
//! controller API, the way the CLI `register` command does.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use landreg::form::{
    FieldIssue, FormData, FormSchema, NullRenderer, SimulatedSubmission, StepController,
    SubmissionOutcome, SubmissionPhase, SubmissionReceipt, SubmissionSink,
};

/// Sink that counts how many submissions ran to completion
struct CountingSink {
    delay: Duration,
    completed: Arc<AtomicUsize>,
}

#[async_trait]
impl SubmissionSink for CountingSink {
    fn name(&self) -> &str {
        "counting"
    }

    async fn submit(&self, data: &FormData) -> anyhow::Result<SubmissionReceipt> {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(SubmissionReceipt::for_data(data))
    }
}

fn registration_controller(delay: Duration) -> StepController {
    let schema = FormSchema::registration().expect("built-in form is valid");
    StepController::new(
        schema,
        Arc::new(SimulatedSubmission::new(delay)),
        Box::new(NullRenderer),
    )
}

fn complete_values() -> FormData {
    [
        ("ownerName", "John Smith"),
        ("ownerId", "NAT-89345621"),
        ("ownerEmail", "john.smith@example.com"),
        ("ownerPhone", "+1 (555) 123-4567"),
        ("propertyType", "Residential"),
        ("propertyArea", "250"),
        ("propertyAddress", "123 Main Street, Capital City"),
        ("deedNumber", "DEED-2023-0042"),
    ]
    .into_iter()
    .collect()
}

fn fill(controller: &mut StepController, values: &FormData) {
    for (field, value) in values.iter() {
        controller.set_value(field, value).unwrap();
    }
}

#[test]
fn test_owner_step_reports_all_missing_fields() {
    let mut controller = registration_controller(Duration::from_millis(10));

    let result = controller.go_next().unwrap();

    assert_eq!(controller.current_step(), 0);
    assert_eq!(result.errors().len(), 4);
    assert!(result
        .errors()
        .iter()
        .all(|e| e.issue == FieldIssue::Required));
}

#[test]
fn test_owner_phone_with_leading_zero_blocks() {
    let mut controller = registration_controller(Duration::from_millis(10));
    fill(&mut controller, &complete_values());
    controller.set_value("ownerPhone", "0123456789").unwrap();

    let result = controller.go_next().unwrap();

    assert_eq!(controller.current_step(), 0);
    assert_eq!(result.errors().len(), 1);
    assert_eq!(
        result.error_for("ownerPhone").map(|e| e.message.as_str()),
        Some("Please enter a valid phone number")
    );
    assert!(result.passed().contains(&"ownerEmail".to_string()));
}

#[test]
fn test_optional_phone_on_last_step_is_checked() {
    let mut controller = registration_controller(Duration::from_millis(10));
    fill(&mut controller, &complete_values());
    controller.go_next().unwrap();
    controller.go_next().unwrap();
    controller
        .set_value("alternatePhone", "12345678901234567")
        .unwrap();

    let result = controller.go_next().unwrap();

    assert_eq!(controller.current_step(), 2);
    assert_eq!(
        result.error_for("alternatePhone").map(|e| e.issue),
        Some(FieldIssue::InvalidPhone)
    );
}

#[test]
fn test_back_and_forth_keeps_values() {
    let mut controller = registration_controller(Duration::from_millis(10));
    fill(&mut controller, &complete_values());

    assert!(controller.go_next().unwrap().is_valid());
    assert!(controller.go_prev().unwrap());
    assert_eq!(controller.current_step(), 0);
    assert_eq!(controller.value("ownerName").unwrap(), "John Smith");
    assert!(controller.go_next().unwrap().is_valid());
    assert_eq!(controller.progress().reached, vec![true, true, false]);
}

#[tokio::test]
async fn test_full_registration_submits_and_resets() {
    let mut controller = registration_controller(Duration::from_millis(20));
    fill(&mut controller, &complete_values());

    while !controller.is_final_step() {
        assert!(controller.go_next().unwrap().is_valid());
    }
    assert!(controller.submit().unwrap().is_valid());
    assert!(controller.phase().is_submitting());

    let outcome = controller.wait_for_submission().await;

    let Some(SubmissionOutcome::Submitted(receipt)) = outcome else {
        panic!("registration was not submitted");
    };
    assert_eq!(receipt.field_count, 8);
    assert!(receipt.reference.starts_with("REG-"));
    assert_eq!(controller.current_step(), 0);
    assert!(controller.values().is_empty());
    assert!(matches!(controller.phase(), SubmissionPhase::Submitted(_)));
}

#[tokio::test]
async fn test_dropping_controller_mid_submission() {
    let completed = Arc::new(AtomicUsize::new(0));
    let sink = CountingSink {
        delay: Duration::from_millis(50),
        completed: completed.clone(),
    };
    let schema = FormSchema::registration().unwrap();
    let mut controller = StepController::new(schema, Arc::new(sink), Box::new(NullRenderer));
    fill(&mut controller, &complete_values());
    controller.go_next().unwrap();
    controller.go_next().unwrap();
    assert!(controller.submit().unwrap().is_valid());

    drop(controller);
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(completed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_counting_sink_completes_without_drop() {
    let completed = Arc::new(AtomicUsize::new(0));
    let sink = CountingSink {
        delay: Duration::from_millis(10),
        completed: completed.clone(),
    };
    let schema = FormSchema::registration().unwrap();
    let mut controller = StepController::new(schema, Arc::new(sink), Box::new(NullRenderer));
    fill(&mut controller, &complete_values());
    controller.go_next().unwrap();
    controller.go_next().unwrap();
    controller.submit().unwrap();

    assert!(matches!(
        controller.wait_for_submission().await,
        Some(SubmissionOutcome::Submitted(_))
    ));
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}
