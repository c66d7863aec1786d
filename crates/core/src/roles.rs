//! Roles carried in access-token claims.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A logbook user's role. Serialized as the snake_case role name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    CollegeAdmin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::CollegeAdmin => "college_admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Whether this role may create, edit, or deactivate templates.
    pub fn can_manage_templates(self) -> bool {
        matches!(self, Self::CollegeAdmin | Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "college_admin" => Ok(Self::CollegeAdmin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}
