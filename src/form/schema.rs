//! Form definitions: steps, fields and field kinds

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::FormError;

/// Built-in land registration form (source of truth: src/form/builtin/)
const REGISTRATION_FORM: &str = include_str!("builtin/registration.json");

/// Kind tag that selects the format check applied to a field's value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text, only the required check applies
    #[default]
    Plain,
    /// Must look like `local@domain.part`
    Email,
    /// Digits only after stripping punctuation, up to 16 digits
    Phone,
}

/// Schema definition for a single input field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field identifier, unique across the whole form
    pub id: String,
    /// Human-readable label
    #[serde(default)]
    pub label: String,
    /// Format check to apply
    #[serde(default)]
    pub kind: FieldKind,
    /// Whether the field must hold a non-empty trimmed value
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl FieldSchema {
    pub fn new(id: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind,
            required,
            placeholder: None,
        }
    }
}

/// One page of the multi-step form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSchema {
    /// Step identifier (lowercase)
    pub id: String,
    /// Title shown in the progress indicator
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl StepSchema {
    pub fn new(id: impl Into<String>, title: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            fields,
        }
    }

    /// Get a field of this step by id
    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// A complete form definition.
///
/// Constructed through [`FormSchema::new`] or one of the parsers, all of which
/// reject forms without steps and duplicate step or field ids. A `FormSchema`
/// in hand therefore always has at least one step.
#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub name: String,
    steps: Vec<StepSchema>,
}

#[derive(Deserialize)]
struct RawFormSchema {
    name: String,
    steps: Vec<StepSchema>,
}

impl FormSchema {
    pub fn new(name: impl Into<String>, steps: Vec<StepSchema>) -> Result<Self, FormError> {
        if steps.is_empty() {
            return Err(FormError::EmptyForm);
        }

        let mut step_ids = HashSet::new();
        let mut field_ids = HashSet::new();
        for step in &steps {
            if !step_ids.insert(step.id.as_str()) {
                return Err(FormError::DuplicateStep(step.id.clone()));
            }
            for field in &step.fields {
                if !field_ids.insert(field.id.as_str()) {
                    return Err(FormError::DuplicateField(field.id.clone()));
                }
            }
        }

        Ok(Self {
            name: name.into(),
            steps,
        })
    }

    /// Parse a form definition from JSON
    pub fn from_json(json: &str) -> Result<Self, FormError> {
        let raw: RawFormSchema = serde_json::from_str(json)
            .map_err(|e| FormError::InvalidDefinition(e.to_string()))?;
        Self::new(raw.name, raw.steps)
    }

    /// Parse a form definition from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, FormError> {
        let raw: RawFormSchema = serde_yaml::from_str(yaml)
            .map_err(|e| FormError::InvalidDefinition(e.to_string()))?;
        Self::new(raw.name, raw.steps)
    }

    /// The built-in land registration form
    pub fn registration() -> Result<Self, FormError> {
        Self::from_json(REGISTRATION_FORM)
    }

    pub fn steps(&self) -> &[StepSchema] {
        &self.steps
    }

    /// Number of steps, always at least one
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Get a step by index
    pub fn step(&self, index: usize) -> Result<&StepSchema, FormError> {
        self.steps.get(index).ok_or(FormError::StepOutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    /// Find a field anywhere in the form
    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.steps.iter().find_map(|s| s.field(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_form_parses() {
        let schema = FormSchema::registration().unwrap();
        assert_eq!(schema.len(), 3);
        assert!(schema.field("ownerPhone").is_some());
        assert_eq!(
            schema.field("ownerEmail").map(|f| f.kind),
            Some(FieldKind::Email)
        );
        assert!(!schema.is_empty());
        assert_eq!(
            schema
                .field("ownerPhone")
                .and_then(|f| f.placeholder.as_deref()),
            Some("+1 555 123 4567")
        );
    }

    #[test]
    fn test_empty_form_rejected() {
        let err = FormSchema::new("empty", vec![]).unwrap_err();
        assert!(matches!(err, FormError::EmptyForm));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let steps = vec![
            StepSchema::new("a", "A", vec![FieldSchema::new("name", FieldKind::Plain, true)]),
            StepSchema::new("b", "B", vec![FieldSchema::new("name", FieldKind::Plain, false)]),
        ];
        let err = FormSchema::new("dup", steps).unwrap_err();
        assert!(matches!(err, FormError::DuplicateField(ref id) if id == "name"));
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let steps = vec![
            StepSchema::new("a", "A", vec![]),
            StepSchema::new("a", "Again", vec![]),
        ];
        assert!(matches!(
            FormSchema::new("dup", steps),
            Err(FormError::DuplicateStep(_))
        ));
    }

    #[test]
    fn test_step_out_of_range() {
        let schema = FormSchema::registration().unwrap();
        let err = schema.step(7).unwrap_err();
        assert!(matches!(err, FormError::StepOutOfRange { index: 7, len: 3 }));
    }

    #[test]
    fn test_from_yaml_defaults() {
        let yaml = r"
name: contact
steps:
  - id: contact
    fields:
      - id: email
        kind: email
        required: true
      - id: nickname
";
        let schema = FormSchema::from_yaml(yaml).unwrap();
        let step = schema.step(0).unwrap();
        assert_eq!(step.fields.len(), 2);
        assert_eq!(step.fields[1].kind, FieldKind::Plain);
        assert!(!step.fields[1].required);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            FormSchema::from_json("{ not json"),
            Err(FormError::InvalidDefinition(_))
        ));
    }
}
