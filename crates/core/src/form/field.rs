//! Field definitions and field values.
//!
//! A finalized field is a [`FieldDefinition`] whose type is the tagged union
//! [`FieldKind`]: only `select` carries options, so a select without options
//! cannot be represented once a schema has passed finalize-time checks.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field type
// ---------------------------------------------------------------------------

/// The input type of a field, without any per-type payload.
///
/// Builder drafts carry this plain tag; finalized schemas carry [`FieldKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Textarea,
    Select,
    Checkbox,
    File,
}

impl FieldType {
    /// Wire name of the type (`"text"`, `"select"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::File => "file",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field type with its type-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field_type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Textarea,
    Select { options: Vec<String> },
    Checkbox,
    File,
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text => FieldType::Text,
            Self::Number => FieldType::Number,
            Self::Date => FieldType::Date,
            Self::Textarea => FieldType::Textarea,
            Self::Select { .. } => FieldType::Select,
            Self::Checkbox => FieldType::Checkbox,
            Self::File => FieldType::File,
        }
    }

    /// Options of a select field; empty for every other type.
    pub fn options(&self) -> &[String] {
        match self {
            Self::Select { options } => options,
            _ => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Field definition
// ---------------------------------------------------------------------------

/// One typed input slot within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Machine key, unique across the whole template.
    pub field_name: String,
    /// Human-readable label.
    pub field_label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub is_required: bool,
}

impl FieldDefinition {
    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Descriptor returned by the upload service for a `file` field.
///
/// Only `url` is persisted; `name` lives in client state for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    pub name: String,
}

/// A single field value as submitted or stored.
///
/// Untagged on the wire: JSON booleans, numbers, strings, and
/// `{ "url", "name" }` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    File(UploadedFile),
}

impl FieldValue {
    /// Whether this value counts as "present" for a field of `kind`.
    ///
    /// - `file` fields need an uploaded-file descriptor with a URL; a bare
    ///   string does not count.
    /// - `checkbox` fields need `true`.
    /// - Text values must contain something other than whitespace.
    pub fn is_filled_for(&self, kind: &FieldKind) -> bool {
        match (kind, self) {
            (FieldKind::File, Self::File(file)) => !file.url.trim().is_empty(),
            (FieldKind::File, _) => false,
            (FieldKind::Checkbox, Self::Bool(checked)) => *checked,
            (_, Self::Text(s)) => !s.trim().is_empty(),
            (_, Self::File(file)) => !file.url.trim().is_empty(),
            (_, Self::Bool(_) | Self::Number(_)) => true,
        }
    }

    /// Whether there is nothing worth storing: empty or whitespace-only text,
    /// or a file descriptor without a URL.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::File(file) => file.url.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// The value as text, for select-membership and parse checks.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(_) | Self::File(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<UploadedFile> for FieldValue {
    fn from(value: UploadedFile) -> Self {
        Self::File(value)
    }
}
