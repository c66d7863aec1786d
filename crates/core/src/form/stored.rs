//! Stored entry values and read-side display ordering.
//!
//! Storage keeps the long-standing JSON shape:
//!
//! ```json
//! {
//!   "Vitals": { "_sequence": 1, "temperature": "98.6" },
//!   "legacyFlatField": "value"
//! }
//! ```
//!
//! Object-valued keys are groups; an optional `_sequence` (or older
//! `*sequence`) number inside a group carries its display order. Scalar
//! top-level keys are ungrouped values from older entries.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::field::{FieldKind, FieldValue, UploadedFile};
use super::render::RawValues;
use super::schema::{is_sequence_key, DynamicSchema, PERSONAL_INFO_GROUP};

/// Key written for a group's display order.
pub const SEQUENCE_KEY: &str = "_sequence";

/// Order given to groups stored without a sequence number.
pub const UNSEQUENCED_ORDER: i64 = 999;

/// One group of stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGroup {
    pub group_name: String,
    pub display_order: Option<i64>,
    /// `(field_name, value)` in stored key order.
    pub values: Vec<(String, FieldValue)>,
}

/// The values of one entry, grouped as they were stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicFields {
    pub groups: Vec<StoredGroup>,
    /// Top-level scalar values written by older, ungrouped forms.
    pub ungrouped: Vec<(String, FieldValue)>,
}

/// A group prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayGroup {
    pub group_name: String,
    pub display_order: i64,
    pub fields: Vec<DisplayValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayValue {
    pub field_name: String,
    pub value: FieldValue,
}

/// Read-side view of an entry's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayView {
    pub groups: Vec<DisplayGroup>,
    pub ungrouped: Vec<DisplayValue>,
}

impl DynamicFields {
    /// Find a stored value by field name, in any group or ungrouped.
    pub fn value(&self, field_name: &str) -> Option<&FieldValue> {
        self.groups
            .iter()
            .flat_map(|g| g.values.iter())
            .chain(self.ungrouped.iter())
            .find(|(name, _)| name == field_name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.values.is_empty()) && self.ungrouped.is_empty()
    }

    /// Groups ordered by display order ascending; groups without one sort
    /// last (as [`UNSEQUENCED_ORDER`]). Ties keep stored order.
    pub fn sort_by_sequence(&self) -> Vec<&StoredGroup> {
        let mut groups: Vec<&StoredGroup> = self.groups.iter().collect();
        groups.sort_by_key(|g| g.display_order.unwrap_or(UNSEQUENCED_ORDER));
        groups
    }

    /// Sequence-ordered display groups, without the reserved
    /// [`PERSONAL_INFO_GROUP`].
    pub fn display_groups(&self) -> DisplayView {
        let groups = self
            .sort_by_sequence()
            .into_iter()
            .filter(|g| g.group_name != PERSONAL_INFO_GROUP)
            .map(|g| DisplayGroup {
                group_name: g.group_name.clone(),
                display_order: g.display_order.unwrap_or(UNSEQUENCED_ORDER),
                fields: to_display_values(&g.values),
            })
            .collect();

        DisplayView {
            groups,
            ungrouped: to_display_values(&self.ungrouped),
        }
    }

    /// Rebuild raw values from storage so a saved draft can be re-validated.
    ///
    /// Stored URLs of `file` fields become upload descriptors named after
    /// the last path segment of the URL.
    pub fn to_raw_values(&self, schema: &DynamicSchema) -> RawValues {
        self.groups
            .iter()
            .flat_map(|g| g.values.iter())
            .chain(self.ungrouped.iter())
            .map(|(name, value)| {
                let is_file = schema
                    .find_field(name)
                    .is_some_and(|(_, f)| f.kind == FieldKind::File);
                let value = match value {
                    FieldValue::Text(url) if is_file => FieldValue::File(UploadedFile {
                        url: url.clone(),
                        name: url.rsplit('/').next().unwrap_or(url).to_string(),
                    }),
                    other => other.clone(),
                };
                (name.clone(), value)
            })
            .collect()
    }
}

fn to_display_values(values: &[(String, FieldValue)]) -> Vec<DisplayValue> {
    values
        .iter()
        .map(|(name, value)| DisplayValue {
            field_name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// JSON conversion
// ---------------------------------------------------------------------------

impl Serialize for DynamicFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len() + self.ungrouped.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.group_name, &GroupRef(group))?;
        }
        for (name, value) in &self.ungrouped {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct GroupRef<'a>(&'a StoredGroup);

impl Serialize for GroupRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let group = self.0;
        let len = group.values.len() + usize::from(group.display_order.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(order) = group.display_order {
            map.serialize_entry(SEQUENCE_KEY, &order)?;
        }
        for (name, value) in &group.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DynamicFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(D::Error::custom)
    }
}

impl DynamicFields {
    /// Parse the stored JSON shape.
    ///
    /// Null values are skipped. Values that are neither scalars nor upload
    /// descriptors are rejected.
    pub fn from_json_map(map: Map<String, Value>) -> Result<Self, String> {
        let mut fields = Self::default();

        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::Object(inner) if !is_upload_descriptor(&inner) => {
                    fields.groups.push(parse_group(key, inner)?);
                }
                other => {
                    let value = parse_value(&key, other)?;
                    fields.ungrouped.push((key, value));
                }
            }
        }

        Ok(fields)
    }
}

fn is_upload_descriptor(map: &Map<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("url") && map.contains_key("name")
}

fn parse_group(group_name: String, inner: Map<String, Value>) -> Result<StoredGroup, String> {
    let mut display_order = None;
    let mut values = Vec::with_capacity(inner.len());

    for (key, value) in inner {
        if is_sequence_key(&key) {
            display_order = display_order.or_else(|| sequence_number(&value));
            continue;
        }
        if value.is_null() {
            continue;
        }
        let value = parse_value(&key, value)?;
        values.push((key, value));
    }

    Ok(StoredGroup {
        group_name,
        display_order,
        values,
    })
}

fn parse_value(key: &str, value: Value) -> Result<FieldValue, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid value for '{key}': {e}"))
}

/// Sequence markers were written both as numbers and numeric strings.
fn sequence_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
