//! Document HTTP Routes
//!
//! Upload, listing, detail, download and the two lifecycle transitions.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiError;
use crate::document::{
    parse_document_id, DocumentDetail, DocumentRepository, DocumentSummary, LifecycleView, NewFile,
};

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_id: Uuid,
}

/// Fields collected from the upload form
#[derive(Debug, Default)]
struct UploadForm {
    document_name: String,
    owner_dept: String,
    file: Option<NewFile>,
}

// ==================
// Document Routes
// ==================

/// Create document routes
pub fn document_routes(repo: DocumentRepository) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .route("/documents", get(list_documents_handler))
        .route("/document/:id", get(get_document_handler))
        .route("/download/:id", get(download_handler))
        .route("/approve/:id", put(approve_handler))
        .route("/validate/:id", put(validate_handler))
        .with_state(repo)
}

// ==================
// Helper Functions
// ==================

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document_name" => form.document_name = field_text(field).await?,
            "owner_dept" => form.owner_dept = field_text(field).await?,
            "file" => {
                // Browsers send an empty, nameless part when no file was chosen
                let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Invalid file part: {}", e.body_text()))
                })?;
                if !file_name.is_empty() {
                    form.file = Some(NewFile {
                        file_name,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid form field: {}", e.body_text())))
}

/// Filename safe to place inside a quoted header parameter
fn disposition_filename(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

// ==================
// Handlers
// ==================

async fn upload_handler(
    State(repo): State<DocumentRepository>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let form = read_upload_form(multipart).await?;
    let document_id = repo
        .create(&form.document_name, &form.owner_dept, form.file)
        .await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { document_id })))
}

async fn list_documents_handler(
    State(repo): State<DocumentRepository>,
) -> Result<Json<Vec<DocumentSummary>>, ApiError> {
    Ok(Json(repo.list().await?))
}

async fn get_document_handler(
    State(repo): State<DocumentRepository>,
    Path(id): Path<String>,
) -> Result<Json<DocumentDetail>, ApiError> {
    let id = parse_document_id(&id)?;
    Ok(Json(repo.get_detail(id).await?))
}

async fn download_handler(
    State(repo): State<DocumentRepository>,
    Path(id): Path<String>,
) -> Result<(StatusCode, HeaderMap, Bytes), ApiError> {
    let id = parse_document_id(&id)?;
    let content = repo.get_content(id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        disposition_filename(&content.file_name)
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_bytes(disposition.as_bytes())
            .map_err(|e| ApiError::Internal(format!("content-disposition: {e}")))?,
    );

    Ok((StatusCode::OK, headers, Bytes::from(content.data)))
}

async fn approve_handler(
    State(repo): State<DocumentRepository>,
    Path(id): Path<String>,
) -> Result<Json<LifecycleView>, ApiError> {
    let id = parse_document_id(&id)?;
    Ok(Json(repo.approve(id).await?.lifecycle()))
}

async fn validate_handler(
    State(repo): State<DocumentRepository>,
    Path(id): Path<String>,
) -> Result<Json<LifecycleView>, ApiError> {
    let id = parse_document_id(&id)?;
    Ok(Json(repo.review(id).await?.lifecycle()))
}
