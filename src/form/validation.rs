//! Field and step validation

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::schema::{FieldKind, FieldSchema, FormSchema};
use super::{FormData, FormError};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("valid phone regex"));

/// Why a single field failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldIssue {
    Required,
    InvalidEmail,
    InvalidPhone,
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldIssue::Required => write!(f, "This field is required"),
            FieldIssue::InvalidEmail => write!(f, "Please enter a valid email address"),
            FieldIssue::InvalidPhone => write!(f, "Please enter a valid phone number"),
        }
    }
}

/// A failing field and the message to show next to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub issue: FieldIssue,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, issue: FieldIssue) -> Self {
        Self {
            field: field.to_string(),
            issue,
            message: issue.to_string(),
        }
    }
}

/// Outcome of validating one step.
///
/// Lists every failing field, and every passing field so a renderer can clear
/// stale annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub step: usize,
    errors: Vec<FieldError>,
    passed: Vec<String>,
}

impl ValidationResult {
    /// A passing result with nothing to annotate
    pub fn empty(step: usize) -> Self {
        Self {
            step,
            errors: Vec::new(),
            passed: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Ids of fields that passed every check
    pub fn passed(&self) -> &[String] {
        &self.passed
    }

    /// Error for a given field, if it failed
    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

/// Email check: something before `@`, something after containing a dot,
/// no whitespace and no second `@`
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Phone check: non-digits are stripped first, then the remaining digits
/// must start with 1-9 and be at most 16 long
pub fn is_valid_phone(value: &str) -> bool {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    PHONE_RE.is_match(&digits)
}

/// Validate a single field value.
///
/// The required check runs first; format checks only apply to non-empty values.
pub fn validate_field(field: &FieldSchema, value: &str) -> Result<(), FieldIssue> {
    if field.required && value.trim().is_empty() {
        return Err(FieldIssue::Required);
    }
    if value.is_empty() {
        return Ok(());
    }

    match field.kind {
        FieldKind::Plain => Ok(()),
        FieldKind::Email if is_valid_email(value) => Ok(()),
        FieldKind::Email => Err(FieldIssue::InvalidEmail),
        FieldKind::Phone if is_valid_phone(value) => Ok(()),
        FieldKind::Phone => Err(FieldIssue::InvalidPhone),
    }
}

/// Validate every field of one step against the current values.
///
/// All fields are checked, so the result carries every error at once.
pub fn validate_step(
    schema: &FormSchema,
    index: usize,
    values: &FormData,
) -> Result<ValidationResult, FormError> {
    let step = schema.step(index)?;
    let mut result = ValidationResult::empty(index);

    for field in &step.fields {
        match validate_field(field, values.get(&field.id)) {
            Ok(()) => result.passed.push(field.id.clone()),
            Err(issue) => result.errors.push(FieldError::new(&field.id, issue)),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::schema::StepSchema;

    #[test]
    fn test_email_rule() {
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("jane.doe@registry.gov.example"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("ab.c"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("a@@b.c"));
    }

    #[test]
    fn test_phone_rule() {
        assert!(is_valid_phone("+12345678901"));
        assert!(is_valid_phone("(555) 123-4567"));
        assert!(!is_valid_phone("0123456789"));
        assert!(!is_valid_phone("12345678901234567"));
        assert!(is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_required_blank_value() {
        let field = FieldSchema::new("name", FieldKind::Plain, true);
        assert_eq!(validate_field(&field, ""), Err(FieldIssue::Required));
        assert_eq!(validate_field(&field, "   "), Err(FieldIssue::Required));
        assert_eq!(validate_field(&field, "John"), Ok(()));
    }

    #[test]
    fn test_optional_email_empty_passes() {
        let field = FieldSchema::new("contact", FieldKind::Email, false);
        assert_eq!(validate_field(&field, ""), Ok(()));
        assert_eq!(validate_field(&field, "nope"), Err(FieldIssue::InvalidEmail));
    }

    #[test]
    fn test_required_wins_over_format() {
        let field = FieldSchema::new("phone", FieldKind::Phone, true);
        assert_eq!(validate_field(&field, " "), Err(FieldIssue::Required));
    }

    #[test]
    fn test_phone_checked_by_kind_not_id() {
        let field = FieldSchema::new("alternatePhone", FieldKind::Phone, false);
        assert_eq!(validate_field(&field, "0000"), Err(FieldIssue::InvalidPhone));
    }

    #[test]
    fn test_validate_step_reports_every_error() {
        let schema = FormSchema::new(
            "test",
            vec![StepSchema::new(
                "one",
                "One",
                vec![
                    FieldSchema::new("name", FieldKind::Plain, true),
                    FieldSchema::new("email", FieldKind::Email, true),
                    FieldSchema::new("phone", FieldKind::Phone, false),
                    FieldSchema::new("notes", FieldKind::Plain, false),
                ],
            )],
        )
        .unwrap();

        let values: FormData = [("email", "bad"), ("phone", "012")].into_iter().collect();
        let result = validate_step(&schema, 0, &values).unwrap();

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 3);
        assert_eq!(
            result.error_for("name").map(|e| e.message.as_str()),
            Some("This field is required")
        );
        assert_eq!(
            result.error_for("email").map(|e| e.issue),
            Some(FieldIssue::InvalidEmail)
        );
        assert_eq!(
            result.error_for("phone").map(|e| e.issue),
            Some(FieldIssue::InvalidPhone)
        );
        assert_eq!(result.passed(), ["notes".to_string()]);
    }

    #[test]
    fn test_validate_step_out_of_range() {
        let schema = FormSchema::new("test", vec![StepSchema::new("one", "One", vec![])]).unwrap();
        let err = validate_step(&schema, 1, &FormData::new()).unwrap_err();
        assert!(matches!(err, FormError::StepOutOfRange { index: 1, len: 1 }));
    }
}
