//! Database row structs.
//!
//! Each submodule contains a `FromRow` struct matching the table row and its
//! conversion into the `logbook_core` domain type.

pub mod entry;
pub mod template;
