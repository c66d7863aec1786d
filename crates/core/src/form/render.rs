//! Entry rendering, validation, and serialization against a schema.
//!
//! All functions here are pure: they read a [`DynamicSchema`] and raw
//! client values and never mutate their inputs.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::field::{FieldDefinition, FieldKind, FieldValue, UploadedFile};
use super::schema::DynamicSchema;
use super::stored::{DynamicFields, StoredGroup};
use crate::error::CoreError;

/// Raw values submitted by a client, keyed by field name.
pub type RawValues = HashMap<String, FieldValue>;

/// Upload results keyed by the `file` field they belong to.
pub type FileUploads = HashMap<String, UploadedFile>;

/// Accepted format for `date` fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// A field flattened out of its group for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedField {
    #[serde(flatten)]
    pub field: FieldDefinition,
    pub group_name: String,
}

/// Flatten the schema's groups into the authoritative field order.
///
/// This order drives both input rendering and storage key generation.
pub fn render_fields(schema: &DynamicSchema) -> Vec<RenderedField> {
    schema
        .groups
        .iter()
        .flat_map(|group| {
            group.fields.iter().map(|field| RenderedField {
                field: field.clone(),
                group_name: group.group_name.clone(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A present value that is not acceptable for its field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProblem {
    pub field_name: String,
    pub message: String,
}

/// Outcome of [`validate`].
///
/// Only `missing_fields` and `invalid_fields` decide `ok`. `warnings` flag
/// values that look wrong for their type but are stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    /// Required fields with no usable value, in render order.
    pub missing_fields: Vec<String>,
    /// Required `select` fields whose value is not one of the options.
    pub invalid_fields: Vec<FieldProblem>,
    #[serde(default)]
    pub warnings: Vec<FieldProblem>,
}

impl ValidationResult {
    /// Convert into a `Result`, failing with [`CoreError::ValidationFailed`].
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.ok {
            Ok(())
        } else {
            Err(CoreError::ValidationFailed {
                missing_fields: self.missing_fields,
                invalid_fields: self.invalid_fields,
            })
        }
    }
}

/// Check raw values against the schema.
///
/// `ok` holds exactly when every required field has a non-empty value (see
/// [`FieldValue::is_filled_for`]) and every required `select` value is one
/// of its options. Other type mismatches (an out-of-list optional select,
/// a non-numeric `number`, a non-ISO `date`) land in `warnings`.
/// Values for names the schema does not define are ignored.
pub fn validate(schema: &DynamicSchema, values: &RawValues) -> ValidationResult {
    let mut missing_fields = Vec::new();
    let mut invalid_fields = Vec::new();
    let mut warnings = Vec::new();

    for group in &schema.groups {
        for field in &group.fields {
            let value = values
                .get(&field.field_name)
                .filter(|v| v.is_filled_for(&field.kind));

            let Some(value) = value else {
                if field.is_required {
                    missing_fields.push(field.field_name.clone());
                }
                continue;
            };

            let Some(message) = check_value(field, value) else {
                continue;
            };
            let problem = FieldProblem {
                field_name: field.field_name.clone(),
                message,
            };
            let blocking = field.is_required && matches!(field.kind, FieldKind::Select { .. });
            if blocking {
                invalid_fields.push(problem);
            } else {
                warnings.push(problem);
            }
        }
    }

    ValidationResult {
        ok: missing_fields.is_empty() && invalid_fields.is_empty(),
        missing_fields,
        invalid_fields,
        warnings,
    }
}

/// Type-specific check of a present value. Returns an error message.
fn check_value(field: &FieldDefinition, value: &FieldValue) -> Option<String> {
    let label = &field.field_label;
    match &field.kind {
        FieldKind::Select { options } => match value.as_text() {
            Some(choice) if options.iter().any(|o| *o == choice) => None,
            Some(choice) => Some(format!(
                "Invalid value '{choice}' for field '{label}'. Allowed: {}",
                options.join(", ")
            )),
            None => Some(format!("Field '{label}' must be one of: {}", options.join(", "))),
        },
        FieldKind::Number => match value {
            FieldValue::Number(_) => None,
            FieldValue::Text(s) if s.trim().parse::<f64>().is_ok_and(f64::is_finite) => None,
            _ => Some(format!("Field '{label}' should be a number")),
        },
        FieldKind::Date => match value {
            FieldValue::Text(s) if NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).is_ok() => {
                None
            }
            _ => Some(format!("Field '{label}' should be a date (YYYY-MM-DD)")),
        },
        FieldKind::Checkbox => match value {
            FieldValue::Bool(_) => None,
            _ => Some(format!("Field '{label}' should be true or false")),
        },
        FieldKind::Text | FieldKind::Textarea => match value {
            FieldValue::Text(_) | FieldValue::Number(_) => None,
            _ => Some(format!("Field '{label}' should be text")),
        },
        // Only an uploaded-file descriptor counts as filled.
        FieldKind::File => None,
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Build the stored field map for an entry.
///
/// Scalar fields keep their raw value verbatim. `file` fields store only the
/// uploaded URL, taken from `uploads` or from a descriptor in `values`; the
/// display name is dropped. Absent values and blank text are omitted, as are
/// groups left empty. An explicit `false` is kept. Every stored group
/// records its display order.
pub fn serialize(schema: &DynamicSchema, values: &RawValues, uploads: &FileUploads) -> DynamicFields {
    let mut groups = Vec::new();

    for group in &schema.groups {
        let mut stored = Vec::new();

        for field in &group.fields {
            let name = &field.field_name;
            let value = match field.kind {
                FieldKind::File => uploads
                    .get(name)
                    .or_else(|| match values.get(name) {
                        Some(FieldValue::File(file)) => Some(file),
                        _ => None,
                    })
                    .filter(|file| !file.url.trim().is_empty())
                    .map(|file| FieldValue::Text(file.url.clone())),
                _ => values.get(name).filter(|v| !v.is_blank()).cloned(),
            };

            if let Some(value) = value {
                stored.push((name.clone(), value));
            }
        }

        if !stored.is_empty() {
            groups.push(StoredGroup {
                group_name: group.group_name.clone(),
                display_order: Some(i64::from(group.display_order)),
                values: stored,
            });
        }
    }

    DynamicFields {
        groups,
        ungrouped: Vec::new(),
    }
}
