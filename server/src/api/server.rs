//! API server initialization

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::routing::{get, get_service};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use super::middleware::{self, UuidRequestId};
use super::routes::files::{self, FilesState};
use super::routes::health;
use crate::core::constants::REQUEST_ID_HEADER;
use crate::core::{CoreApp, OwnerKey};
use crate::data::FileRepository;

pub struct ApiServer {
    app: CoreApp,
    router: Router,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let router = build_router(
            app.repository.clone(),
            app.config.owner_key.clone(),
            app.config.server.max_upload_size,
            app.config.server.favicon.clone(),
        );
        Self { app, router }
    }

    /// Serve until shutdown is triggered; returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app, router } = self;

        let host = app.config.server.host.as_str();
        let port = app.config.server.port;
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind {host}:{port}"))?;
        tracing::debug!(addr = ?listener.local_addr().ok(), "Listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(app.shutdown.wait())
            .await
            .context("HTTP server error")?;

        Ok(app)
    }
}

/// Build the full router over a repository
///
/// `/{*path}` does not match `/`, so the root carries its own upload route.
/// `/version` and `/favicon.ico` accept PUT so that uploading to them
/// reports a reserved id. A missing favicon file answers 404.
pub fn build_router(
    repository: FileRepository,
    owner_key: OwnerKey,
    max_upload_size: usize,
    favicon: PathBuf,
) -> Router {
    let state = FilesState {
        repository,
        owner_key: Arc::new(owner_key),
    };

    let tracing = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .route("/", get(health::index).put(files::upload))
        .route("/version", get(health::version).put(files::upload))
        .route(
            "/favicon.ico",
            get_service(ServeFile::new(favicon)).put(files::upload),
        )
        .route("/api/v1/health", get(health::health))
        .route(
            "/{*path}",
            get(files::download)
                .put(files::upload)
                .delete(files::remove),
        )
        .fallback(middleware::handle_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(middleware::cors())
        .layer(CompressionLayer::new())
        .layer(tracing)
}
