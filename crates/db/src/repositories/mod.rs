//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod entry_repo;
pub mod template_repo;

pub use entry_repo::EntryRepo;
pub use template_repo::{TemplateRepo, TemplateUpdateOutcome};
