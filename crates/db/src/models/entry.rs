//! Row model for the `logbook_entries` table.

use logbook_core::entry::Entry;
use logbook_core::error::CoreError;
use logbook_core::form::stored::DynamicFields;
use logbook_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `logbook_entries` table.
#[derive(Debug, Clone, FromRow)]
pub struct EntryRow {
    pub id: DbId,
    pub template_id: DbId,
    pub student_id: DbId,
    pub student_subject_id: Option<DbId>,
    pub teacher_id: Option<DbId>,
    pub status: String,
    pub dynamic_fields: Json<DynamicFields>,
    pub student_remarks: Option<String>,
    pub teacher_remarks: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<EntryRow> for Entry {
    type Error = CoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Entry {
            id: row.id,
            template_id: row.template_id,
            student_id: row.student_id,
            student_subject_id: row.student_subject_id,
            teacher_id: row.teacher_id,
            status: row.status.parse()?,
            dynamic_fields: row.dynamic_fields.0,
            student_remarks: row.student_remarks,
            teacher_remarks: row.teacher_remarks,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
