//! Persistence collaborators for templates and entries.
//!
//! The API layer holds these as `Arc<dyn ...>` so the Postgres
//! implementations in `logbook-db` and the in-memory ones in [`memory`] are
//! interchangeable.

pub mod memory;

use async_trait::async_trait;

use crate::entry::{Entry, EntryFilter, EntryStatus, NewEntry};
use crate::error::CoreError;
use crate::form::stored::DynamicFields;
use crate::template::{NewTemplate, Template, TemplateFilter, TemplateUpdate};
use crate::types::DbId;

pub use memory::{InMemoryEntryStore, InMemoryTemplateStore};

/// Template persistence.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Persist a template whose schema has already been finalized.
    async fn create(&self, input: NewTemplate) -> Result<Template, CoreError>;

    /// Fails with [`CoreError::NotFound`] for unknown ids.
    async fn get(&self, id: DbId) -> Result<Template, CoreError>;

    /// Matching templates ordered by id.
    async fn list(&self, filter: &TemplateFilter) -> Result<Vec<Template>, CoreError>;

    /// Apply `update` if the stored revision equals `update.expected_revision`,
    /// bumping the revision. Fails with [`CoreError::Conflict`] otherwise, or
    /// when `update` carries a schema and any entry references the template.
    /// The entry check and the write happen atomically with entry creation.
    async fn update(&self, id: DbId, update: TemplateUpdate) -> Result<Template, CoreError>;

    /// Soft (de)activation; templates are never hard-deleted.
    async fn set_active(&self, id: DbId, active: bool) -> Result<Template, CoreError>;
}

/// Entry persistence.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Fails with [`CoreError::NotFound`] if the template does not exist.
    async fn create(&self, input: NewEntry) -> Result<Entry, CoreError>;

    async fn get(&self, id: DbId) -> Result<Entry, CoreError>;

    /// Matching entries ordered by id.
    async fn list(&self, filter: &EntryFilter) -> Result<Vec<Entry>, CoreError>;

    /// Replace the values of a `DRAFT` entry. Fails with
    /// [`CoreError::Conflict`] once the entry has left `DRAFT`.
    async fn update_values(
        &self,
        id: DbId,
        dynamic_fields: DynamicFields,
        student_remarks: Option<String>,
    ) -> Result<Entry, CoreError>;

    /// Move an entry from `expected` to `to` atomically.
    ///
    /// Fails with [`CoreError::InvalidTransition`] if `expected -> to` is not
    /// an allowed move, and with [`CoreError::Conflict`] if the stored status
    /// is no longer `expected`. Nothing is written on failure.
    async fn update_status(
        &self,
        id: DbId,
        expected: EntryStatus,
        to: EntryStatus,
        teacher_remarks: Option<String>,
    ) -> Result<Entry, CoreError>;
}

/// Conflict error for a status compare-and-set that lost a race.
pub fn stale_status(id: DbId, expected: EntryStatus, actual: EntryStatus) -> CoreError {
    CoreError::Conflict(format!(
        "Entry {id} is {actual}, expected {expected}; reload and retry"
    ))
}

/// Conflict error for a template update against an old revision.
pub fn stale_revision(id: DbId, expected: i32, actual: i32) -> CoreError {
    CoreError::Conflict(format!(
        "Template {id} is at revision {actual}, update was based on {expected}"
    ))
}

/// Conflict error for a schema change on a template that already has entries.
pub fn schema_frozen(id: DbId, entry_count: i64) -> CoreError {
    CoreError::Conflict(format!(
        "Template {id} has {entry_count} entries; its schema can no longer change"
    ))
}

/// Conflict error for editing values of a non-draft entry.
pub fn entry_locked(id: DbId, status: EntryStatus) -> CoreError {
    CoreError::Conflict(format!("Entry {id} is {status} and can no longer be edited"))
}
