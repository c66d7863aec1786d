//! Repository for the `logbook_templates` table.

use logbook_core::template::{NewTemplate, TemplateFilter, TemplateUpdate};
use logbook_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::template::TemplateRow;

/// Column list for logbook_templates queries.
const COLUMNS: &str = "id, name, description, template_type, academic_year_id, batch_id, \
    subject_id, module_id, dynamic_schema, created_by, revision, is_active, \
    created_at, updated_at";

/// Result of [`TemplateRepo::update`].
#[derive(Debug)]
pub enum TemplateUpdateOutcome {
    Updated(TemplateRow),
    NotFound,
    /// The stored revision, which differs from the expected one.
    StaleRevision(i32),
    /// A schema change was requested but this many entries exist.
    SchemaFrozen(i64),
}

/// Provides CRUD operations for logbook templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Insert a new template at revision 1, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewTemplate) -> Result<TemplateRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO logbook_templates
                (name, description, template_type, academic_year_id, batch_id,
                 subject_id, module_id, dynamic_schema, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.template_type.as_str())
            .bind(input.scope.academic_year_id)
            .bind(input.scope.batch_id)
            .bind(input.scope.subject_id)
            .bind(input.scope.module_id)
            .bind(Json(&input.dynamic_schema))
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a template by ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TemplateRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM logbook_templates WHERE id = $1");
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List templates matching every set filter field, ordered by ID.
    pub async fn list(
        pool: &PgPool,
        filter: &TemplateFilter,
    ) -> Result<Vec<TemplateRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM logbook_templates
             WHERE ($1::BIGINT IS NULL OR academic_year_id = $1)
               AND ($2::BIGINT IS NULL OR batch_id = $2)
               AND ($3::BIGINT IS NULL OR subject_id = $3)
               AND ($4::BIGINT IS NULL OR module_id = $4)
               AND ($5::TEXT IS NULL OR template_type = $5)
               AND ($6 OR is_active)
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(filter.academic_year_id)
            .bind(filter.batch_id)
            .bind(filter.subject_id)
            .bind(filter.module_id)
            .bind(filter.template_type.map(|t| t.as_str()))
            .bind(filter.include_inactive)
            .fetch_all(pool)
            .await
    }

    /// Apply an update if the stored revision still matches, bumping it.
    ///
    /// Runs in a transaction that locks the template row first. The lock
    /// conflicts with the foreign-key check of concurrent entry inserts, so
    /// the entry count seen here cannot change before the update commits.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &TemplateUpdate,
    ) -> Result<TemplateUpdateOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let revision = sqlx::query_scalar::<_, i32>(
            "SELECT revision FROM logbook_templates WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(revision) = revision else {
            return Ok(TemplateUpdateOutcome::NotFound);
        };
        if revision != input.expected_revision {
            return Ok(TemplateUpdateOutcome::StaleRevision(revision));
        }

        if input.dynamic_schema.is_some() {
            let entry_count = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM logbook_entries WHERE template_id = $1",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if entry_count > 0 {
                return Ok(TemplateUpdateOutcome::SchemaFrozen(entry_count));
            }
        }

        let query = format!(
            "UPDATE logbook_templates SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                dynamic_schema = COALESCE($4, dynamic_schema),
                revision = revision + 1,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TemplateRow>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.dynamic_schema.as_ref().map(Json))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TemplateUpdateOutcome::Updated(row))
    }

    /// Set the active flag. Returns `None` if the template does not exist.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        active: bool,
    ) -> Result<Option<TemplateRow>, sqlx::Error> {
        let query = format!(
            "UPDATE logbook_templates SET is_active = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(id)
            .bind(active)
            .fetch_optional(pool)
            .await
    }
}
