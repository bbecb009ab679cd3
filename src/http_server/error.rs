//! Facade error mapping
//!
//! Every failure that reaches a handler is logged here with its full detail and
//! answered with a generic JSON body. Internal messages never reach clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::document::DocumentError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Handler-level error
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client-correctable input problem; the message is shown to the client
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Server-side failure; the detail is logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body shown to the client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::NotFound(_) => "Not found".to_string(),
            ApiError::Internal(_) => "Server error".to_string(),
        }
    }

    /// Log at a level matching the status
    pub fn log(&self) {
        match self {
            ApiError::Internal(detail) => tracing::error!(error = %detail, "request failed"),
            ApiError::BadRequest(detail) => tracing::warn!(error = %detail, "bad request"),
            ApiError::NotFound(what) => tracing::debug!(%what, "not found"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

impl From<DocumentError> for ApiError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::Validation(msg) => ApiError::BadRequest(msg),
            DocumentError::NotFound(id) => ApiError::NotFound(id),
            DocumentError::Storage(_) | DocumentError::Database(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}
