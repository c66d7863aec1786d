//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireTemplateAdmin`] -- Requires `college_admin` or `super_admin`.
//! - [`rbac::RequireStudent`] -- Requires the `student` role.
//! - [`rbac::RequireTeacher`] -- Requires the `teacher` role.

pub mod auth;
pub mod rbac;
