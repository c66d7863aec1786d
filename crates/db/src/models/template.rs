//! Row model for the `logbook_templates` table.

use logbook_core::error::CoreError;
use logbook_core::form::schema::DynamicSchema;
use logbook_core::template::{Template, TemplateScope};
use logbook_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `logbook_templates` table.
#[derive(Debug, Clone, FromRow)]
pub struct TemplateRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub template_type: String,
    pub academic_year_id: Option<DbId>,
    pub batch_id: Option<DbId>,
    pub subject_id: Option<DbId>,
    pub module_id: Option<DbId>,
    pub dynamic_schema: Json<DynamicSchema>,
    pub created_by: Option<DbId>,
    pub revision: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<TemplateRow> for Template {
    type Error = CoreError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        Ok(Template {
            id: row.id,
            name: row.name,
            description: row.description,
            template_type: row.template_type.parse()?,
            scope: TemplateScope {
                academic_year_id: row.academic_year_id,
                batch_id: row.batch_id,
                subject_id: row.subject_id,
                module_id: row.module_id,
            },
            dynamic_schema: row.dynamic_schema.0,
            created_by: row.created_by,
            revision: row.revision,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
