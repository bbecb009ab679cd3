//! Audit HTTP Routes
//!
//! Audit listing, insertion and the per-status summary used by the dashboard.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Serialize;

use super::error::ErrorResponse;
use crate::audit::{Audit, AuditError, AuditRepository, StatusCount};

/// Create audit routes
pub fn audit_routes(repo: AuditRepository) -> Router {
    Router::new()
        .route("/audits", get(list_audits_handler).post(add_audit_handler))
        .route("/audit-status-summary", get(status_summary_handler))
        .with_state(repo)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct AddAuditResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<Audit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AddAuditResponse {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            audit: None,
            message: Some(message.into()),
        }
    }
}

// ==================
// Handlers
// ==================

async fn list_audits_handler(
    State(repo): State<AuditRepository>,
) -> Result<Json<Vec<Audit>>, (StatusCode, Json<ErrorResponse>)> {
    repo.list().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to fetch audits");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to fetch audits.")),
        )
    })
}

async fn add_audit_handler(
    State(repo): State<AuditRepository>,
    Json(audit): Json<Audit>,
) -> (StatusCode, Json<AddAuditResponse>) {
    match repo.insert(audit).await {
        Ok(audit) => (
            StatusCode::OK,
            Json(AddAuditResponse {
                success: true,
                audit: Some(audit),
                message: None,
            }),
        ),
        Err(AuditError::Validation(msg)) => {
            (StatusCode::BAD_REQUEST, Json(AddAuditResponse::failed(msg)))
        }
        Err(AuditError::Duplicate(id)) => (
            StatusCode::CONFLICT,
            Json(AddAuditResponse::failed(format!("Audit {id} already exists."))),
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to add audit");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AddAuditResponse::failed("Failed to add audit.")),
            )
        }
    }
}

async fn status_summary_handler(
    State(repo): State<AuditRepository>,
) -> Result<Json<Vec<StatusCount>>, (StatusCode, Json<ErrorResponse>)> {
    repo.status_summary().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to fetch audit summary");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to fetch audit summary.")),
        )
    })
}
