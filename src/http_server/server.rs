//! # HTTP Server
//!
//! Combines every endpoint router into one axum application.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::audit_routes::audit_routes;
use super::auth_routes::auth_routes;
use super::config::HttpServerConfig;
use super::document_routes::document_routes;
use super::incident_routes::incident_routes;
use super::observability_routes::health_routes;
use crate::audit::AuditRepository;
use crate::auth::UserRepository;
use crate::blob::BlobStore;
use crate::clock::Clock;
use crate::db::DbPool;
use crate::document::DocumentRepository;
use crate::incident::IncidentRepository;

/// Shared application state: the pool and every repository built on it
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub documents: DocumentRepository,
    pub audits: AuditRepository,
    pub incidents: IncidentRepository,
    pub users: UserRepository,
}

impl AppState {
    pub fn new(pool: DbPool, blobs: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            documents: DocumentRepository::new(pool.clone(), Arc::clone(&blobs), clock),
            audits: AuditRepository::new(pool.clone()),
            incidents: IncidentRepository::new(pool.clone(), blobs),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }
}

/// HTTP server for the compliance tracker
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around the given state
    pub fn with_config(config: HttpServerConfig, state: AppState) -> Self {
        let router = build_router(&config, &state);
        Self {
            config,
            state,
            router,
        }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until ctrl-c, then close the pool
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {e}", self.config.socket_addr()),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "compliance tracker listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.state.pool.close();
        tracing::info!("server stopped, database pool closed");
        Ok(())
    }
}

/// Build the combined router with all endpoints
pub fn build_router(config: &HttpServerConfig, state: &AppState) -> Router {
    let cors = if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let mut router = Router::new()
        .merge(health_routes(state.pool.clone()))
        .merge(document_routes(state.documents.clone()))
        .merge(audit_routes(state.audits.clone()))
        .merge(incident_routes(state.incidents.clone()))
        .merge(auth_routes(state.users.clone()));

    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::clock::SystemClock;

    fn state() -> AppState {
        AppState::new(
            DbPool::open_in_memory().unwrap(),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn test_server_with_custom_port() {
        let server = HttpServer::with_config(HttpServerConfig::with_port(8080), state());
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_router_builds_with_static_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = HttpServerConfig {
            static_dir: Some(temp.path().to_path_buf()),
            cors_origins: vec!["http://localhost:3000".into()],
            ..Default::default()
        };
        let _router = HttpServer::with_config(config, state()).router();
    }
}
