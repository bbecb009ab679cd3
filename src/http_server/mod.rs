//! # HTTP Server Module
//!
//! The REST facade: document upload/listing/download and lifecycle
//! transitions, plus login, audits, incidents and health.
//!
//! # Endpoints
//!
//! - `POST /upload`, `GET /documents`, `GET /document/:id`, `GET /download/:id`
//! - `PUT /approve/:id`, `PUT /validate/:id`
//! - `POST /login`
//! - `GET|POST /audits`, `GET /audit-status-summary`
//! - `GET /api/incidents`, `POST /submit-incident`
//! - `GET /health`

pub mod audit_routes;
pub mod auth_routes;
pub mod config;
pub mod document_routes;
pub mod error;
pub mod incident_routes;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use error::{ApiError, ErrorResponse};
pub use server::{build_router, AppState, HttpServer};
