//! In-memory template builder.
//!
//! The builder holds a loosely-typed draft of the group/field tree while an
//! administrator edits it. Nothing is persisted here; [`TemplateBuilder::finalize`]
//! produces the cleaned, typed [`DynamicSchema`] that the template store saves.

use serde::{Deserialize, Serialize};

use super::field::{FieldDefinition, FieldKind, FieldType};
use super::schema::{DynamicSchema, GroupDefinition};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Draft types
// ---------------------------------------------------------------------------

/// A field as edited in the builder. Any combination of values is allowed
/// until finalize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftField {
    /// Left blank to derive the name from the label.
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub field_label: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftGroup {
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub fields: Vec<DraftField>,
}

/// The builder's whole editable state, as exchanged with the admin UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSchema {
    #[serde(default)]
    pub groups: Vec<DraftGroup>,
}

/// Shallow patch applied by [`TemplateBuilder::update_field`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldPatch {
    pub field_name: Option<String>,
    pub field_label: Option<String>,
    pub field_type: Option<FieldType>,
    pub is_required: Option<bool>,
    pub options: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Mutation API over a [`DraftSchema`].
///
/// Out-of-range indices fail with [`CoreError::IndexOutOfRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBuilder {
    draft: DraftSchema,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateBuilder {
    /// Start with one unnamed group holding one blank field.
    pub fn new() -> Self {
        Self {
            draft: DraftSchema {
                groups: vec![blank_group()],
            },
        }
    }

    /// Resume editing a draft received from the admin UI.
    pub fn from_draft(draft: DraftSchema) -> Self {
        Self { draft }
    }

    /// Load a finalized schema back into editable form.
    pub fn from_schema(schema: &DynamicSchema) -> Self {
        let groups = schema
            .groups
            .iter()
            .map(|group| DraftGroup {
                group_name: group.group_name.clone(),
                fields: group
                    .fields
                    .iter()
                    .map(|field| DraftField {
                        field_name: field.field_name.clone(),
                        field_label: field.field_label.clone(),
                        field_type: field.field_type(),
                        is_required: field.is_required,
                        options: field.kind.options().to_vec(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            draft: DraftSchema { groups },
        }
    }

    pub fn draft(&self) -> &DraftSchema {
        &self.draft
    }

    pub fn into_draft(self) -> DraftSchema {
        self.draft
    }

    /// Append an unnamed group with one blank field; returns its index.
    pub fn add_group(&mut self) -> usize {
        self.draft.groups.push(blank_group());
        self.draft.groups.len() - 1
    }

    pub fn remove_group(&mut self, group: usize) -> Result<(), CoreError> {
        self.group_mut(group)?;
        self.draft.groups.remove(group);
        Ok(())
    }

    pub fn rename_group(&mut self, group: usize, name: &str) -> Result<(), CoreError> {
        self.group_mut(group)?.group_name = name.to_string();
        Ok(())
    }

    /// Append a blank, optional `text` field; returns its index.
    pub fn add_field(&mut self, group: usize) -> Result<usize, CoreError> {
        let fields = &mut self.group_mut(group)?.fields;
        fields.push(DraftField::default());
        Ok(fields.len() - 1)
    }

    pub fn remove_field(&mut self, group: usize, field: usize) -> Result<(), CoreError> {
        self.field_mut(group, field)?;
        self.draft.groups[group].fields.remove(field);
        Ok(())
    }

    /// Shallow-merge `patch` into the field.
    pub fn update_field(
        &mut self,
        group: usize,
        field: usize,
        patch: FieldPatch,
    ) -> Result<(), CoreError> {
        let target = self.field_mut(group, field)?;
        if let Some(name) = patch.field_name {
            target.field_name = name;
        }
        if let Some(label) = patch.field_label {
            target.field_label = label;
        }
        if let Some(field_type) = patch.field_type {
            target.field_type = field_type;
        }
        if let Some(required) = patch.is_required {
            target.is_required = required;
        }
        if let Some(options) = patch.options {
            target.options = options;
        }
        Ok(())
    }

    /// Append a dropdown option to a `select` field.
    ///
    /// The option is trimmed; blank options, duplicates, and non-select
    /// fields are ignored. Returns whether the option was appended.
    pub fn add_dropdown_option(
        &mut self,
        group: usize,
        field: usize,
        option: &str,
    ) -> Result<bool, CoreError> {
        let target = self.field_mut(group, field)?;
        let option = option.trim();
        if target.field_type != FieldType::Select
            || option.is_empty()
            || target.options.iter().any(|o| o == option)
        {
            return Ok(false);
        }
        target.options.push(option.to_string());
        Ok(true)
    }

    pub fn remove_dropdown_option(
        &mut self,
        group: usize,
        field: usize,
        option: usize,
    ) -> Result<(), CoreError> {
        let options = &mut self.field_mut(group, field)?.options;
        if option >= options.len() {
            return Err(CoreError::IndexOutOfRange {
                target: "option",
                index: option,
                len: options.len(),
            });
        }
        options.remove(option);
        Ok(())
    }

    /// Produce the cleaned schema.
    ///
    /// Fields with a blank label are dropped, then groups left without
    /// fields. Missing field names are derived from labels, select options
    /// are trimmed, and display order follows list position. The result is
    /// checked with [`DynamicSchema::check`]; nothing surviving yields
    /// [`SchemaProblem::EmptySchema`](super::schema::SchemaProblem::EmptySchema).
    ///
    /// Builder state is not modified, so repeated calls agree.
    pub fn finalize(&self) -> Result<DynamicSchema, CoreError> {
        let mut groups: Vec<GroupDefinition> = Vec::new();

        for draft_group in &self.draft.groups {
            let fields: Vec<FieldDefinition> = draft_group
                .fields
                .iter()
                .filter(|f| !f.field_label.trim().is_empty())
                .map(finalize_field)
                .collect();

            if fields.is_empty() {
                continue;
            }

            groups.push(GroupDefinition {
                group_name: draft_group.group_name.trim().to_string(),
                display_order: (groups.len() + 1) as u32,
                fields,
            });
        }

        let schema = DynamicSchema { groups };
        schema.check()?;
        Ok(schema)
    }

    fn group_mut(&mut self, group: usize) -> Result<&mut DraftGroup, CoreError> {
        let len = self.draft.groups.len();
        self.draft
            .groups
            .get_mut(group)
            .ok_or(CoreError::IndexOutOfRange {
                target: "group",
                index: group,
                len,
            })
    }

    fn field_mut(&mut self, group: usize, field: usize) -> Result<&mut DraftField, CoreError> {
        let fields = &mut self.group_mut(group)?.fields;
        let len = fields.len();
        fields.get_mut(field).ok_or(CoreError::IndexOutOfRange {
            target: "field",
            index: field,
            len,
        })
    }
}

fn blank_group() -> DraftGroup {
    DraftGroup {
        group_name: String::new(),
        fields: vec![DraftField::default()],
    }
}

fn finalize_field(draft: &DraftField) -> FieldDefinition {
    let label = draft.field_label.trim().to_string();
    let name = match draft.field_name.trim() {
        "" => derive_field_name(&label),
        explicit => explicit.to_string(),
    };

    let kind = match draft.field_type {
        FieldType::Text => FieldKind::Text,
        FieldType::Number => FieldKind::Number,
        FieldType::Date => FieldKind::Date,
        FieldType::Textarea => FieldKind::Textarea,
        FieldType::Checkbox => FieldKind::Checkbox,
        FieldType::File => FieldKind::File,
        FieldType::Select => {
            let mut options: Vec<String> = Vec::with_capacity(draft.options.len());
            for option in &draft.options {
                let option = option.trim();
                if !option.is_empty() && !options.iter().any(|o| o == option) {
                    options.push(option.to_string());
                }
            }
            FieldKind::Select { options }
        }
    };

    FieldDefinition {
        field_name: name,
        field_label: label,
        kind,
        is_required: draft.is_required,
    }
}

/// Derive a machine key from a label: lowercase, runs of anything other
/// than ASCII letters and digits collapsed to `_`.
///
/// ```
/// use logbook_core::form::builder::derive_field_name;
///
/// assert_eq!(derive_field_name("Blood Pressure (mmHg)"), "blood_pressure_mmhg");
/// assert_eq!(derive_field_name("  Temperature "), "temperature");
/// ```
pub fn derive_field_name(label: &str) -> String {
    let mut name = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            name.push(ch.to_ascii_lowercase());
        } else if !name.is_empty() && !name.ends_with('_') {
            name.push('_');
        }
    }
    while name.ends_with('_') {
        name.pop();
    }
    name
}
