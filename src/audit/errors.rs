//! # Audit Errors

use thiserror::Error;

use crate::db::DbError;

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Audit already exists: {0}")]
    Duplicate(String),

    #[error("Database failure: {0}")]
    Database(#[from] DbError),
}
