//! `logbook_core::store` implementations backed by Postgres.

use async_trait::async_trait;
use logbook_core::entry::{Entry, EntryFilter, EntryStatus, NewEntry};
use logbook_core::error::CoreError;
use logbook_core::form::stored::DynamicFields;
use logbook_core::store::{
    entry_locked, schema_frozen, stale_revision, stale_status, EntryStore, TemplateStore,
};
use logbook_core::template::{NewTemplate, Template, TemplateFilter, TemplateUpdate};
use logbook_core::types::DbId;

use crate::error::{is_foreign_key_violation, map_db_error};
use crate::repositories::{EntryRepo, TemplateRepo, TemplateUpdateOutcome};
use crate::DbPool;

const TEMPLATE: &str = "Template";
const ENTRY: &str = "Entry";

/// Constraint tying entries to their template.
const FK_ENTRY_TEMPLATE: &str = "fk_logbook_entries_template";

#[derive(Clone)]
pub struct PgTemplateStore {
    pool: DbPool,
}

impl PgTemplateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn create(&self, input: NewTemplate) -> Result<Template, CoreError> {
        let row = TemplateRepo::create(&self.pool, &input)
            .await
            .map_err(|e| map_db_error(e, TEMPLATE, 0))?;
        row.try_into()
    }

    async fn get(&self, id: DbId) -> Result<Template, CoreError> {
        TemplateRepo::find_by_id(&self.pool, id)
            .await
            .map_err(|e| map_db_error(e, TEMPLATE, id))?
            .ok_or(CoreError::NotFound {
                entity: TEMPLATE,
                id,
            })?
            .try_into()
    }

    async fn list(&self, filter: &TemplateFilter) -> Result<Vec<Template>, CoreError> {
        TemplateRepo::list(&self.pool, filter)
            .await
            .map_err(|e| map_db_error(e, TEMPLATE, 0))?
            .into_iter()
            .map(Template::try_from)
            .collect()
    }

    async fn update(&self, id: DbId, update: TemplateUpdate) -> Result<Template, CoreError> {
        let outcome = TemplateRepo::update(&self.pool, id, &update)
            .await
            .map_err(|e| map_db_error(e, TEMPLATE, id))?;

        match outcome {
            TemplateUpdateOutcome::Updated(row) => row.try_into(),
            TemplateUpdateOutcome::StaleRevision(actual) => {
                Err(stale_revision(id, update.expected_revision, actual))
            }
            TemplateUpdateOutcome::SchemaFrozen(entry_count) => Err(schema_frozen(id, entry_count)),
            TemplateUpdateOutcome::NotFound => Err(CoreError::NotFound {
                entity: TEMPLATE,
                id,
            }),
        }
    }

    async fn set_active(&self, id: DbId, active: bool) -> Result<Template, CoreError> {
        TemplateRepo::set_active(&self.pool, id, active)
            .await
            .map_err(|e| map_db_error(e, TEMPLATE, id))?
            .ok_or(CoreError::NotFound {
                entity: TEMPLATE,
                id,
            })?
            .try_into()
    }
}

#[derive(Clone)]
pub struct PgEntryStore {
    pool: DbPool,
}

impl PgEntryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn create(&self, input: NewEntry) -> Result<Entry, CoreError> {
        let row = EntryRepo::create(&self.pool, &input).await.map_err(|e| {
            if is_foreign_key_violation(&e, FK_ENTRY_TEMPLATE) {
                CoreError::NotFound {
                    entity: TEMPLATE,
                    id: input.template_id,
                }
            } else {
                map_db_error(e, ENTRY, 0)
            }
        })?;
        row.try_into()
    }

    async fn get(&self, id: DbId) -> Result<Entry, CoreError> {
        EntryRepo::find_by_id(&self.pool, id)
            .await
            .map_err(|e| map_db_error(e, ENTRY, id))?
            .ok_or(CoreError::NotFound { entity: ENTRY, id })?
            .try_into()
    }

    async fn list(&self, filter: &EntryFilter) -> Result<Vec<Entry>, CoreError> {
        EntryRepo::list(&self.pool, filter)
            .await
            .map_err(|e| map_db_error(e, ENTRY, 0))?
            .into_iter()
            .map(Entry::try_from)
            .collect()
    }

    async fn update_values(
        &self,
        id: DbId,
        dynamic_fields: DynamicFields,
        student_remarks: Option<String>,
    ) -> Result<Entry, CoreError> {
        let updated =
            EntryRepo::update_draft_values(&self.pool, id, &dynamic_fields, student_remarks.as_deref())
                .await
                .map_err(|e| map_db_error(e, ENTRY, id))?;

        match updated {
            Some(row) => row.try_into(),
            // Missing rows surface as NotFound from `get`.
            None => {
                let current = self.get(id).await?;
                Err(entry_locked(id, current.status))
            }
        }
    }

    async fn update_status(
        &self,
        id: DbId,
        expected: EntryStatus,
        to: EntryStatus,
        teacher_remarks: Option<String>,
    ) -> Result<Entry, CoreError> {
        expected.transition(to)?;

        let updated =
            EntryRepo::update_status(&self.pool, id, expected, to, teacher_remarks.as_deref())
                .await
                .map_err(|e| map_db_error(e, ENTRY, id))?;

        match updated {
            Some(row) => row.try_into(),
            None => {
                let current = self.get(id).await?;
                Err(stale_status(id, expected, current.status))
            }
        }
    }
}
