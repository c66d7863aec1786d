//! In-memory stores for tests and `STORE_BACKEND=memory`.
//!
//! Both stores share one [`MemoryDb`] behind a single lock, so checks that
//! span templates and entries (reference on create, schema freeze on
//! update) see a consistent view.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{entry_locked, schema_frozen, stale_revision, stale_status, EntryStore, TemplateStore};
use crate::entry::{Entry, EntryFilter, EntryStatus, NewEntry};
use crate::error::CoreError;
use crate::form::stored::DynamicFields;
use crate::template::{NewTemplate, Template, TemplateFilter, TemplateUpdate};
use crate::types::DbId;

struct Table<T> {
    rows: BTreeMap<DbId, T>,
    next_id: DbId,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> DbId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
struct MemoryDb {
    templates: Table<Template>,
    entries: Table<Entry>,
}

impl MemoryDb {
    fn entry_count(&self, template_id: DbId) -> i64 {
        self.entries
            .rows
            .values()
            .filter(|e| e.template_id == template_id)
            .count() as i64
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryTemplateStore {
    db: Arc<RwLock<MemoryDb>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn template_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "Template",
        id,
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn create(&self, input: NewTemplate) -> Result<Template, CoreError> {
        let mut db = self.db.write().await;
        let id = db.templates.allocate_id();
        let now = Utc::now();
        let template = Template {
            id,
            name: input.name,
            description: input.description,
            template_type: input.template_type,
            scope: input.scope,
            dynamic_schema: input.dynamic_schema,
            created_by: input.created_by,
            revision: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.templates.rows.insert(id, template.clone());
        Ok(template)
    }

    async fn get(&self, id: DbId) -> Result<Template, CoreError> {
        let db = self.db.read().await;
        db.templates
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| template_not_found(id))
    }

    async fn list(&self, filter: &TemplateFilter) -> Result<Vec<Template>, CoreError> {
        let db = self.db.read().await;
        Ok(db
            .templates
            .rows
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn update(&self, id: DbId, update: TemplateUpdate) -> Result<Template, CoreError> {
        let mut db = self.db.write().await;
        let entry_count = db.entry_count(id);
        let template = db
            .templates
            .rows
            .get_mut(&id)
            .ok_or_else(|| template_not_found(id))?;

        if template.revision != update.expected_revision {
            return Err(stale_revision(id, update.expected_revision, template.revision));
        }
        if update.dynamic_schema.is_some() && entry_count > 0 {
            return Err(schema_frozen(id, entry_count));
        }

        if let Some(name) = update.name {
            template.name = name;
        }
        if let Some(description) = update.description {
            template.description = Some(description);
        }
        if let Some(schema) = update.dynamic_schema {
            template.dynamic_schema = schema;
        }
        template.revision += 1;
        template.updated_at = Utc::now();
        Ok(template.clone())
    }

    async fn set_active(&self, id: DbId, active: bool) -> Result<Template, CoreError> {
        let mut db = self.db.write().await;
        let template = db
            .templates
            .rows
            .get_mut(&id)
            .ok_or_else(|| template_not_found(id))?;
        template.is_active = active;
        template.updated_at = Utc::now();
        Ok(template.clone())
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Entry store sharing its data with an [`InMemoryTemplateStore`].
pub struct InMemoryEntryStore {
    db: Arc<RwLock<MemoryDb>>,
}

impl InMemoryEntryStore {
    pub fn new(templates: &InMemoryTemplateStore) -> Self {
        Self {
            db: Arc::clone(&templates.db),
        }
    }
}

fn entry_not_found(id: DbId) -> CoreError {
    CoreError::NotFound { entity: "Entry", id }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn create(&self, input: NewEntry) -> Result<Entry, CoreError> {
        let mut db = self.db.write().await;
        if !db.templates.rows.contains_key(&input.template_id) {
            return Err(template_not_found(input.template_id));
        }

        let id = db.entries.allocate_id();
        let now = Utc::now();
        let entry = Entry {
            id,
            template_id: input.template_id,
            student_id: input.student_id,
            student_subject_id: input.student_subject_id,
            teacher_id: input.teacher_id,
            status: input.status,
            dynamic_fields: input.dynamic_fields,
            student_remarks: input.student_remarks,
            teacher_remarks: None,
            created_at: now,
            updated_at: now,
        };
        db.entries.rows.insert(id, entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: DbId) -> Result<Entry, CoreError> {
        let db = self.db.read().await;
        db.entries
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| entry_not_found(id))
    }

    async fn list(&self, filter: &EntryFilter) -> Result<Vec<Entry>, CoreError> {
        let db = self.db.read().await;
        Ok(db
            .entries
            .rows
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn update_values(
        &self,
        id: DbId,
        dynamic_fields: DynamicFields,
        student_remarks: Option<String>,
    ) -> Result<Entry, CoreError> {
        let mut db = self.db.write().await;
        let entry = db.entries.rows.get_mut(&id).ok_or_else(|| entry_not_found(id))?;

        if entry.status != EntryStatus::Draft {
            return Err(entry_locked(id, entry.status));
        }

        entry.dynamic_fields = dynamic_fields;
        entry.student_remarks = student_remarks;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn update_status(
        &self,
        id: DbId,
        expected: EntryStatus,
        to: EntryStatus,
        teacher_remarks: Option<String>,
    ) -> Result<Entry, CoreError> {
        expected.transition(to)?;

        let mut db = self.db.write().await;
        let entry = db.entries.rows.get_mut(&id).ok_or_else(|| entry_not_found(id))?;

        if entry.status != expected {
            return Err(stale_status(id, expected, entry.status));
        }

        entry.status = to;
        if teacher_remarks.is_some() {
            entry.teacher_remarks = teacher_remarks;
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
