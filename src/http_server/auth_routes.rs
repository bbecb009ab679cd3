//! Auth HTTP Routes
//!
//! Credential check for the dashboard login form.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, UserRepository};

/// Auth routes with shared state
pub fn auth_routes(users: UserRepository) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .with_state(users)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

impl LoginResponse {
    fn new(success: bool, message: &str) -> Self {
        Self {
            success,
            message: message.to_string(),
        }
    }
}

// ==================
// Handlers
// ==================

/// Login handler
///
/// The login page reads `success`, so every outcome answers 200 except a
/// server-side failure.
async fn login_handler(
    State(users): State<UserRepository>,
    Json(request): Json<LoginRequest>,
) -> (StatusCode, Json<LoginResponse>) {
    match users.verify_login(&request.username, &request.password).await {
        Ok(()) => {
            tracing::info!(username = %request.username.trim(), "login succeeded");
            (StatusCode::OK, Json(LoginResponse::new(true, "Login successful")))
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!(username = %request.username.trim(), "login rejected");
            (
                StatusCode::OK,
                Json(LoginResponse::new(false, "Invalid username or password.")),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(LoginResponse::new(false, "Server error.")))
        }
    }
}
