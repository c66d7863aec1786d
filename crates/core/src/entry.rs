//! Logbook entries and the review status state machine.
//!
//! ```text
//! DRAFT ──submit──▶ SUBMITTED ──review──▶ REVIEWED
//! ```
//!
//! There are no backward transitions. Entries may be created directly as
//! `SUBMITTED`; creating or moving to `SUBMITTED` requires the values to
//! pass [`validate`](crate::form::render::validate).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::form::render::{self, FileUploads, RawValues};
use crate::form::stored::DynamicFields;
use crate::template::Template;
use crate::types::{DbId, Timestamp};

/// Maximum length for student or teacher remarks.
pub const MAX_REMARKS_LEN: usize = 5000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Draft,
    Submitted,
    /// Terminal accepted state. Older clients call it `APPROVED`.
    #[serde(alias = "APPROVED")]
    Reviewed,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::Reviewed => "REVIEWED",
        }
    }

    /// Whether `self -> next` is an allowed move.
    pub fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Submitted) | (Self::Submitted, Self::Reviewed)
        )
    }

    /// Return `next` if the move is allowed.
    pub fn transition(self, next: Self) -> Result<Self, CoreError> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = CoreError;

    /// Parse a status string from the database or a query parameter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "SUBMITTED" => Ok(Self::Submitted),
            "REVIEWED" | "APPROVED" => Ok(Self::Reviewed),
            _ => Err(CoreError::Validation(format!(
                "Invalid entry status '{s}'. Must be one of: DRAFT, SUBMITTED, REVIEWED"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// A persisted entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: DbId,
    pub template_id: DbId,
    pub student_id: DbId,
    pub student_subject_id: Option<DbId>,
    pub teacher_id: Option<DbId>,
    pub status: EntryStatus,
    pub dynamic_fields: DynamicFields,
    pub student_remarks: Option<String>,
    pub teacher_remarks: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A validated, serialized entry ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub template_id: DbId,
    pub student_id: DbId,
    pub student_subject_id: Option<DbId>,
    pub teacher_id: Option<DbId>,
    pub status: EntryStatus,
    pub dynamic_fields: DynamicFields,
    pub student_remarks: Option<String>,
}

/// Entry list filter; every set field must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    pub student_id: Option<DbId>,
    pub template_id: Option<DbId>,
    pub student_subject_id: Option<DbId>,
    pub status: Option<EntryStatus>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &Entry) -> bool {
        self.student_id.is_none_or(|id| id == entry.student_id)
            && self.template_id.is_none_or(|id| id == entry.template_id)
            && self
                .student_subject_id
                .is_none_or(|id| Some(id) == entry.student_subject_id)
            && self.status.is_none_or(|s| s == entry.status)
    }
}

/// Raw values a student submits for a template.
#[derive(Debug, Clone, Deserialize)]
pub struct EntrySubmission {
    pub template_id: DbId,
    pub student_subject_id: Option<DbId>,
    pub teacher_id: Option<DbId>,
    /// `DRAFT` or `SUBMITTED`; defaults to `SUBMITTED`.
    pub status: Option<EntryStatus>,
    #[serde(default)]
    pub values: RawValues,
    /// Upload results for `file` fields, keyed by field name.
    #[serde(default)]
    pub uploads: FileUploads,
    pub student_remarks: Option<String>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub fn validate_remarks(remarks: Option<&str>) -> Result<(), CoreError> {
    match remarks {
        Some(r) if r.len() > MAX_REMARKS_LEN => Err(CoreError::Validation(format!(
            "Remarks too long: {} chars (max {MAX_REMARKS_LEN})",
            r.len()
        ))),
        _ => Ok(()),
    }
}

/// Validate (when submitting) and serialize values against a template.
///
/// Drafts are stored without required-field checks; anything headed for
/// `SUBMITTED` must pass validation first.
pub fn prepare_values(
    template: &Template,
    status: EntryStatus,
    values: &RawValues,
    uploads: &FileUploads,
) -> Result<DynamicFields, CoreError> {
    let schema = &template.dynamic_schema;

    if status == EntryStatus::Submitted {
        let mut merged = values.clone();
        for (name, file) in uploads {
            merged.insert(name.clone(), file.clone().into());
        }
        render::validate(schema, &merged).into_result()?;
    }

    Ok(render::serialize(schema, values, uploads))
}

/// Turn a submission into a storable entry.
pub fn prepare_entry(
    template: &Template,
    submission: EntrySubmission,
    student_id: DbId,
) -> Result<NewEntry, CoreError> {
    if !template.is_active {
        return Err(CoreError::Validation(format!(
            "Template {} is no longer accepting entries",
            template.id
        )));
    }

    let status = submission.status.unwrap_or(EntryStatus::Submitted);
    if status == EntryStatus::Reviewed {
        return Err(CoreError::Validation(
            "New entries must be DRAFT or SUBMITTED".to_string(),
        ));
    }
    validate_remarks(submission.student_remarks.as_deref())?;

    let dynamic_fields = prepare_values(template, status, &submission.values, &submission.uploads)?;

    Ok(NewEntry {
        template_id: template.id,
        student_id,
        student_subject_id: submission.student_subject_id,
        teacher_id: submission.teacher_id,
        status,
        dynamic_fields,
        student_remarks: submission.student_remarks,
    })
}

/// Re-validate a stored draft before it moves to `SUBMITTED`.
pub fn check_submittable(template: &Template, entry: &Entry) -> Result<(), CoreError> {
    entry.status.transition(EntryStatus::Submitted)?;
    let schema = &template.dynamic_schema;
    let raw = entry.dynamic_fields.to_raw_values(schema);
    render::validate(schema, &raw).into_result()
}
