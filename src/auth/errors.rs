//! # Auth Errors

use thiserror::Error;

use crate::db::DbError;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Credential errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password (deliberately indistinguishable)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Username already registered
    #[error("Username already registered: {0}")]
    UsernameTaken(String),

    /// Password does not meet requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    /// Username missing or malformed
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Internal error: password hashing failed")]
    HashingFailed,

    #[error("Database failure: {0}")]
    Database(#[from] DbError),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::WeakPassword(_) | AuthError::InvalidUsername(_) => 400,
            AuthError::InvalidCredentials => 401,
            AuthError::UsernameTaken(_) => 409,
            AuthError::HashingFailed | AuthError::Database(_) => 500,
        }
    }
}
