//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation.
//!
//! Login and token refresh live in the identity service; this server only
//! validates the access tokens it issues.

pub mod jwt;
