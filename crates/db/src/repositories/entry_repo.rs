//! Repository for the `logbook_entries` table.

use logbook_core::entry::{EntryFilter, EntryStatus, NewEntry};
use logbook_core::form::stored::DynamicFields;
use logbook_core::types::DbId;
use sqlx::PgPool;

use crate::models::entry::EntryRow;

/// Column list for logbook_entries queries.
const COLUMNS: &str = "id, template_id, student_id, student_subject_id, teacher_id, status, \
    dynamic_fields, student_remarks, teacher_remarks, created_at, updated_at";

/// Provides CRUD operations for logbook entries.
///
/// `dynamic_fields` is bound as text and cast to `JSON` so the stored key
/// order is exactly the serialized order.
pub struct EntryRepo;

fn fields_json(fields: &DynamicFields) -> Result<String, sqlx::Error> {
    serde_json::to_string(fields).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

impl EntryRepo {
    /// Insert a new entry, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewEntry) -> Result<EntryRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO logbook_entries
                (template_id, student_id, student_subject_id, teacher_id, status,
                 dynamic_fields, student_remarks)
             VALUES ($1, $2, $3, $4, $5, $6::JSON, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntryRow>(&query)
            .bind(input.template_id)
            .bind(input.student_id)
            .bind(input.student_subject_id)
            .bind(input.teacher_id)
            .bind(input.status.as_str())
            .bind(fields_json(&input.dynamic_fields)?)
            .bind(&input.student_remarks)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EntryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM logbook_entries WHERE id = $1");
        sqlx::query_as::<_, EntryRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List entries matching every set filter field, ordered by ID.
    pub async fn list(pool: &PgPool, filter: &EntryFilter) -> Result<Vec<EntryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM logbook_entries
             WHERE ($1::BIGINT IS NULL OR student_id = $1)
               AND ($2::BIGINT IS NULL OR template_id = $2)
               AND ($3::BIGINT IS NULL OR student_subject_id = $3)
               AND ($4::TEXT IS NULL OR status = $4)
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, EntryRow>(&query)
            .bind(filter.student_id)
            .bind(filter.template_id)
            .bind(filter.student_subject_id)
            .bind(filter.status.map(EntryStatus::as_str))
            .fetch_all(pool)
            .await
    }

    /// Replace values of a `DRAFT` entry. Returns `None` if the entry does
    /// not exist or is no longer a draft.
    pub async fn update_draft_values(
        pool: &PgPool,
        id: DbId,
        fields: &DynamicFields,
        student_remarks: Option<&str>,
    ) -> Result<Option<EntryRow>, sqlx::Error> {
        let query = format!(
            "UPDATE logbook_entries SET
                dynamic_fields = $2::JSON,
                student_remarks = $3,
                updated_at = NOW()
             WHERE id = $1 AND status = 'DRAFT'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntryRow>(&query)
            .bind(id)
            .bind(fields_json(fields)?)
            .bind(student_remarks)
            .fetch_optional(pool)
            .await
    }

    /// Compare-and-set the status. Returns `None` if the entry does not
    /// exist or its status is no longer `expected`.
    ///
    /// `teacher_remarks` is only overwritten when given.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected: EntryStatus,
        to: EntryStatus,
        teacher_remarks: Option<&str>,
    ) -> Result<Option<EntryRow>, sqlx::Error> {
        let query = format!(
            "UPDATE logbook_entries SET
                status = $3,
                teacher_remarks = COALESCE($4, teacher_remarks),
                updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntryRow>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(to.as_str())
            .bind(teacher_remarks)
            .fetch_optional(pool)
            .await
    }
}
