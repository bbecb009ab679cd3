//! # Blob Store Errors

use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Blob store errors
#[derive(Debug, Clone, Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob handle: {0}")]
    InvalidHandle(String),

    #[error("Storage full")]
    StorageFull,

    #[error("I/O error: {0}")]
    IoError(String),
}

impl BlobError {
    /// Whether the error means the content does not exist, as opposed to the
    /// medium being unavailable
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound(_) | BlobError::InvalidHandle(_))
    }
}

impl From<std::io::Error> for BlobError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => BlobError::NotFound(e.to_string()),
            std::io::ErrorKind::StorageFull => BlobError::StorageFull,
            _ => BlobError::IoError(e.to_string()),
        }
    }
}
