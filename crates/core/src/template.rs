//! Logbook templates: metadata, scope rules, and list filtering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::form::schema::DynamicSchema;
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
   Validation limits
   -------------------------------------------------------------------------- */

/// Maximum length for a template name.
pub const MAX_TEMPLATE_NAME_LEN: usize = 200;

/// Maximum length for a template description.
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/* --------------------------------------------------------------------------
   Types
   -------------------------------------------------------------------------- */

/// Whether a template applies everywhere or to one subject module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    #[default]
    General,
    Subject,
}

impl TemplateType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Subject => "subject",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Self::General),
            "subject" => Ok(Self::Subject),
            _ => Err(CoreError::Validation(format!(
                "Invalid template type '{s}'. Must be one of: general, subject"
            ))),
        }
    }
}

/// Academic context a template is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateScope {
    pub academic_year_id: Option<DbId>,
    pub batch_id: Option<DbId>,
    pub subject_id: Option<DbId>,
    pub module_id: Option<DbId>,
}

/// A persisted template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub template_type: TemplateType,
    #[serde(flatten)]
    pub scope: TemplateScope,
    pub dynamic_schema: DynamicSchema,
    pub created_by: Option<DbId>,
    /// Bumped on every update; callers echo it back to detect concurrent edits.
    pub revision: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a template. The schema must already be finalized.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub template_type: TemplateType,
    #[serde(flatten)]
    pub scope: TemplateScope,
    pub dynamic_schema: DynamicSchema,
    #[serde(default)]
    pub created_by: Option<DbId>,
}

/// Partial update of a template. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dynamic_schema: Option<DynamicSchema>,
    /// Revision the caller last read.
    pub expected_revision: i32,
}

/// List filter; every set field must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilter {
    pub academic_year_id: Option<DbId>,
    pub batch_id: Option<DbId>,
    pub subject_id: Option<DbId>,
    pub module_id: Option<DbId>,
    pub template_type: Option<TemplateType>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl TemplateFilter {
    pub fn matches(&self, template: &Template) -> bool {
        fn eq(want: Option<DbId>, have: Option<DbId>) -> bool {
            want.is_none() || want == have
        }

        (self.include_inactive || template.is_active)
            && eq(self.academic_year_id, template.scope.academic_year_id)
            && eq(self.batch_id, template.scope.batch_id)
            && eq(self.subject_id, template.scope.subject_id)
            && eq(self.module_id, template.scope.module_id)
            && self
                .template_type
                .is_none_or(|t| t == template.template_type)
    }
}

/* --------------------------------------------------------------------------
   Validation functions
   -------------------------------------------------------------------------- */

/// Validate a template name: non-blank and within length limit.
pub fn validate_template_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Template name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_TEMPLATE_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Template name too long: {} chars (max {MAX_TEMPLATE_NAME_LEN})",
            name.len()
        )));
    }
    Ok(())
}

pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    match description {
        Some(d) if d.len() > MAX_DESCRIPTION_LEN => Err(CoreError::Validation(format!(
            "Description too long: {} chars (max {MAX_DESCRIPTION_LEN})",
            d.len()
        ))),
        _ => Ok(()),
    }
}

/// Subject templates must name all four scope keys.
pub fn validate_scope(template_type: TemplateType, scope: &TemplateScope) -> Result<(), CoreError> {
    if template_type == TemplateType::General {
        return Ok(());
    }

    let missing: Vec<&str> = [
        ("academic_year_id", scope.academic_year_id),
        ("batch_id", scope.batch_id),
        ("subject_id", scope.subject_id),
        ("module_id", scope.module_id),
    ]
    .into_iter()
    .filter(|(_, id)| id.is_none())
    .map(|(key, _)| key)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Subject templates require: {}",
            missing.join(", ")
        )))
    }
}

impl NewTemplate {
    /// Full server-side check before persisting, including the schema.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_template_name(&self.name)?;
        validate_description(self.description.as_deref())?;
        validate_scope(self.template_type, &self.scope)?;
        self.dynamic_schema.check()
    }
}

impl TemplateUpdate {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            validate_template_name(name)?;
        }
        validate_description(self.description.as_deref())?;
        if let Some(schema) = &self.dynamic_schema {
            schema.check()?;
        }
        Ok(())
    }
}
