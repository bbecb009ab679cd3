//! # Incident Errors

use thiserror::Error;

use crate::blob::BlobError;
use crate::db::DbError;

/// Result type for incident operations
pub type IncidentResult<T> = Result<T, IncidentError>;

#[derive(Debug, Error)]
pub enum IncidentError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Database failure: {0}")]
    Database(#[from] DbError),
}

impl From<BlobError> for IncidentError {
    fn from(e: BlobError) -> Self {
        IncidentError::Storage(e.to_string())
    }
}
