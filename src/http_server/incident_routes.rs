//! Incident HTTP Routes
//!
//! Incident listing and the report form, which redirects back to the
//! incident page on success.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};

use super::error::ErrorResponse;
use crate::incident::{
    parse_report_date, EvidenceFile, Incident, IncidentError, IncidentRepository, NewIncident,
};

/// Page the report form returns to
pub const INCIDENT_PAGE: &str = "/incident.html";

/// Create incident routes
pub fn incident_routes(repo: IncidentRepository) -> Router {
    Router::new()
        .route("/api/incidents", get(list_incidents_handler))
        .route("/submit-incident", post(submit_incident_handler))
        .with_state(repo)
}

// ==================
// Helper Functions
// ==================

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

async fn read_incident_form(mut multipart: Multipart) -> Result<NewIncident, IncidentError> {
    let bad = |e: axum::extract::multipart::MultipartError| {
        IncidentError::Validation(format!("invalid form: {}", e.body_text()))
    };
    let mut incident = NewIncident::default();

    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "evidence" {
            let file_name = field.file_name().map(str::to_string).unwrap_or_default();
            let data = field.bytes().await.map_err(bad)?;
            if !file_name.is_empty() {
                incident.evidence = Some(EvidenceFile {
                    file_name,
                    data: data.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await.map_err(bad)?;
        match name.as_str() {
            "incidentType" => incident.incident_type = non_blank(value),
            "severity" => incident.severity_level = non_blank(value),
            "date" => incident.date_reported = parse_report_date(&value)?,
            "department" => incident.department = non_blank(value),
            "description" => incident.description = non_blank(value),
            _ => {}
        }
    }

    Ok(incident)
}

// ==================
// Handlers
// ==================

async fn list_incidents_handler(
    State(repo): State<IncidentRepository>,
) -> Result<Json<Vec<Incident>>, (StatusCode, Json<ErrorResponse>)> {
    repo.list().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to fetch incidents");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Database query failed")),
        )
    })
}

async fn submit_incident_handler(
    State(repo): State<IncidentRepository>,
    multipart: Multipart,
) -> Response {
    let submitted = match read_incident_form(multipart).await {
        Ok(incident) => repo.submit(incident).await,
        Err(e) => Err(e),
    };

    match submitted {
        Ok(_) => Redirect::to(INCIDENT_PAGE).into_response(),
        Err(IncidentError::Validation(msg)) => {
            tracing::warn!(error = %msg, "rejected incident report");
            (StatusCode::BAD_REQUEST, msg).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to submit incident");
            (StatusCode::INTERNAL_SERVER_ERROR, "Database insert failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  ".into()), None);
        assert_eq!(non_blank("High".into()), Some("High".into()));
    }
}
