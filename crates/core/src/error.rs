use crate::entry::EntryStatus;
use crate::form::render::FieldProblem;
use crate::form::schema::SchemaProblem;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A template schema failed finalize-time checks. Never persisted.
    #[error("Invalid schema: {}", join_problems(.0))]
    InvalidSchema(Vec<SchemaProblem>),

    /// Entry values are missing required fields or carry invalid choices.
    #[error(
        "Entry validation failed: {} missing, {} invalid",
        .missing_fields.len(),
        .invalid_fields.len()
    )]
    ValidationFailed {
        missing_fields: Vec<String>,
        invalid_fields: Vec<FieldProblem>,
    },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: EntryStatus, to: EntryStatus },

    #[error("{target} index {index} out of range (len {len})")]
    IndexOutOfRange {
        target: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_problems(problems: &[SchemaProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
