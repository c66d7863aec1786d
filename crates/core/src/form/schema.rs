//! Group definitions, the dynamic schema, and finalize-time checks.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::field::{FieldDefinition, FieldKind};
use crate::error::CoreError;

/// Reserved pseudo-group name.
///
/// Older entries carry student profile data under this key. It is never a
/// valid group name in a built template and is skipped by every read-side
/// display list.
pub const PERSONAL_INFO_GROUP: &str = "personalInfo";

/// Allowed shape of a field name once derived or supplied.
static FIELD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid field name regex"));

/// Whether `key` is a group ordering marker rather than a field.
///
/// Matches `_sequence`, a bare `sequence`, and legacy keys that end in a
/// separated suffix (`group_sequence`, `groupSequence`). Words that merely
/// end in the letters, like `consequence`, are ordinary fields.
pub fn is_sequence_key(key: &str) -> bool {
    const CAMEL_SUFFIX: &str = "Sequence";
    key.eq_ignore_ascii_case("sequence")
        || key.ends_with("_sequence")
        || (key.len() > CAMEL_SUFFIX.len() && key.ends_with(CAMEL_SUFFIX))
}

// ---------------------------------------------------------------------------
// Schema types
// ---------------------------------------------------------------------------

/// A named, ordered collection of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub group_name: String,
    /// 1-based display position, assigned when the schema is finalized and
    /// persisted alongside entry values.
    #[serde(default)]
    pub display_order: u32,
    pub fields: Vec<FieldDefinition>,
}

/// The `{ groups: [...] }` structure describing what an entry must contain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSchema {
    pub groups: Vec<GroupDefinition>,
}

/// One reason a schema cannot be finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaProblem {
    /// Nothing survived filtering: no group holds a labeled field.
    EmptySchema,
    BlankGroupName { position: usize },
    DuplicateGroupName { group_name: String },
    ReservedGroupName { group_name: String },
    EmptyGroup { group_name: String },
    BlankFieldLabel { group_name: String, field_name: String },
    InvalidFieldName { group_name: String, field_name: String },
    ReservedFieldName { group_name: String, field_name: String },
    DuplicateFieldName { field_name: String },
    SelectWithoutOptions { group_name: String, field_name: String },
}

impl fmt::Display for SchemaProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySchema => write!(f, "template must contain at least one labeled field"),
            Self::BlankGroupName { position } => write!(f, "group #{position} has no name"),
            Self::DuplicateGroupName { group_name } => {
                write!(f, "group name '{group_name}' is used more than once")
            }
            Self::ReservedGroupName { group_name } => {
                write!(f, "group name '{group_name}' is reserved")
            }
            Self::EmptyGroup { group_name } => write!(f, "group '{group_name}' has no fields"),
            Self::BlankFieldLabel {
                group_name,
                field_name,
            } => write!(f, "field '{field_name}' in group '{group_name}' has no label"),
            Self::InvalidFieldName {
                group_name,
                field_name,
            } => write!(
                f,
                "field name '{field_name}' in group '{group_name}' must start with a letter \
                 and contain only letters, digits, and underscores"
            ),
            Self::ReservedFieldName {
                group_name,
                field_name,
            } => write!(
                f,
                "field name '{field_name}' in group '{group_name}' clashes with the group \
                 sequence marker"
            ),
            Self::DuplicateFieldName { field_name } => {
                write!(f, "field name '{field_name}' is used more than once")
            }
            Self::SelectWithoutOptions {
                group_name,
                field_name,
            } => write!(
                f,
                "select field '{field_name}' in group '{group_name}' has no options"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

impl DynamicSchema {
    /// Run every finalize-time check, collecting all problems.
    ///
    /// Used by the builder on its cleaned output and by the API layer on
    /// schemas loaded for editing.
    pub fn problems(&self) -> Vec<SchemaProblem> {
        if self.groups.is_empty() {
            return vec![SchemaProblem::EmptySchema];
        }

        let mut problems = Vec::new();
        let mut group_names: HashSet<&str> = HashSet::new();
        let mut field_names: HashSet<&str> = HashSet::new();

        for (index, group) in self.groups.iter().enumerate() {
            let group_name = group.group_name.as_str();

            if group_name.trim().is_empty() {
                problems.push(SchemaProblem::BlankGroupName {
                    position: index + 1,
                });
            } else if group_name == PERSONAL_INFO_GROUP {
                problems.push(SchemaProblem::ReservedGroupName {
                    group_name: group_name.to_string(),
                });
            } else if !group_names.insert(group_name) {
                problems.push(SchemaProblem::DuplicateGroupName {
                    group_name: group_name.to_string(),
                });
            }

            if group.fields.is_empty() {
                problems.push(SchemaProblem::EmptyGroup {
                    group_name: group_name.to_string(),
                });
            }

            for field in &group.fields {
                let field_name = field.field_name.as_str();

                if field.field_label.trim().is_empty() {
                    problems.push(SchemaProblem::BlankFieldLabel {
                        group_name: group_name.to_string(),
                        field_name: field_name.to_string(),
                    });
                }

                if !FIELD_NAME_RE.is_match(field_name) {
                    problems.push(SchemaProblem::InvalidFieldName {
                        group_name: group_name.to_string(),
                        field_name: field_name.to_string(),
                    });
                } else if is_sequence_key(field_name) {
                    problems.push(SchemaProblem::ReservedFieldName {
                        group_name: group_name.to_string(),
                        field_name: field_name.to_string(),
                    });
                } else if !field_names.insert(field_name) {
                    problems.push(SchemaProblem::DuplicateFieldName {
                        field_name: field_name.to_string(),
                    });
                }

                if let FieldKind::Select { options } = &field.kind {
                    if options.is_empty() {
                        problems.push(SchemaProblem::SelectWithoutOptions {
                            group_name: group_name.to_string(),
                            field_name: field_name.to_string(),
                        });
                    }
                }
            }
        }

        problems
    }

    /// [`problems`](Self::problems) as a `Result`.
    pub fn check(&self) -> Result<(), CoreError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidSchema(problems))
        }
    }

    /// Look up a field definition by name across all groups.
    pub fn find_field(&self, field_name: &str) -> Option<(&GroupDefinition, &FieldDefinition)> {
        self.groups.iter().find_map(|group| {
            group
                .fields
                .iter()
                .find(|f| f.field_name == field_name)
                .map(|f| (group, f))
        })
    }

    /// Total number of fields across all groups.
    pub fn field_count(&self) -> usize {
        self.groups.iter().map(|g| g.fields.len()).sum()
    }
}
