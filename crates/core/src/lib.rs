//! Logbook form engine core.
//!
//! Pure domain logic for dynamic logbook templates: typed field and group
//! definitions, the template builder, entry rendering / validation /
//! serialization, the entry review state machine, and the collaborator
//! traits (template store, entry store, upload service) the API layer is
//! wired against. Nothing in this crate talks to a database.

pub mod entry;
pub mod error;
pub mod form;
pub mod roles;
pub mod store;
pub mod template;
pub mod types;
pub mod upload;
