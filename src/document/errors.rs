//! # Document Errors

use thiserror::Error;

use crate::blob::BlobError;
use crate::db::DbError;

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document repository errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A required field is missing or blank
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No document (or no file for the document) with this id
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Blob medium unavailable, full, or content corrupt
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Connection, pool or query failure
    #[error("Database failure: {0}")]
    Database(#[from] DbError),
}

impl DocumentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound(id.to_string())
    }
}

impl From<BlobError> for DocumentError {
    fn from(e: BlobError) -> Self {
        DocumentError::Storage(e.to_string())
    }
}

impl From<rusqlite::Error> for DocumentError {
    fn from(e: rusqlite::Error) -> Self {
        DocumentError::Database(DbError::Sqlite(e))
    }
}
