//! Dynamic form engine.
//!
//! - [`builder`]: admin-side editing of a draft schema and finalize-time cleanup.
//! - [`schema`]: the finalized `{ groups: [...] }` schema and its checks.
//! - [`render`]: flattening, validation, and serialization of entry values.
//! - [`stored`]: the persisted value shape and read-side ordering.

pub mod builder;
pub mod field;
pub mod render;
pub mod schema;
pub mod stored;

pub use builder::{DraftField, DraftGroup, DraftSchema, FieldPatch, TemplateBuilder};
pub use field::{FieldDefinition, FieldKind, FieldType, FieldValue, UploadedFile};
pub use render::{
    render_fields, serialize, validate, FieldProblem, FileUploads, RawValues, RenderedField,
    ValidationResult,
};
pub use schema::{DynamicSchema, GroupDefinition, SchemaProblem, PERSONAL_INFO_GROUP};
pub use stored::{DisplayGroup, DisplayValue, DisplayView, DynamicFields, StoredGroup};
