//! Mapping of `sqlx` errors into [`CoreError`].

use logbook_core::error::CoreError;

/// PostgreSQL foreign key violation.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL unique constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL check constraint violation.
pub const CHECK_VIOLATION: &str = "23514";

/// Classify a database error.
///
/// - `RowNotFound` maps to [`CoreError::NotFound`] for `entity`/`id`.
/// - Unique violations on `uq_*` constraints map to [`CoreError::Conflict`].
/// - Check violations map to [`CoreError::Validation`].
/// - Everything else is logged and becomes a sanitized [`CoreError::Internal`].
pub fn map_db_error(err: sqlx::Error, entity: &'static str, id: i64) -> CoreError {
    match &err {
        sqlx::Error::RowNotFound => CoreError::NotFound { entity, id },
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            let constraint = db_err.constraint().unwrap_or("unknown");
            match code.as_deref() {
                Some(UNIQUE_VIOLATION) if constraint.starts_with("uq_") => CoreError::Conflict(
                    format!("Duplicate value violates unique constraint: {constraint}"),
                ),
                Some(CHECK_VIOLATION) => {
                    CoreError::Validation(format!("Value violates constraint: {constraint}"))
                }
                _ => internal(err),
            }
        }
        _ => internal(err),
    }
}

/// Whether `err` is a foreign key violation on `constraint`.
pub fn is_foreign_key_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

fn internal(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::Internal("Database error".to_string())
}
