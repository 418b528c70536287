//! Service info, version and health endpoints

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::core::constants::APP_NAME;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit_hash: &'static str,
    pub build_time: &'static str,
}

/// Plain-text usage summary served at `/`
pub async fn index() -> impl IntoResponse {
    format!(
        "{APP_NAME} {VERSION}\n\n\
         PUT /            upload multipart field `file`, returns a generated id\n\
         PUT /<id>        upload under a chosen id (authorization: owner key)\n\
         GET /<id>        download\n\
         DELETE /<id>     remove (authorization: owner key)\n"
    )
}

pub async fn version() -> impl IntoResponse {
    Json(VersionResponse {
        version: VERSION,
        commit_hash: option_env!("SHORTFILE_COMMIT_HASH").unwrap_or("unknown"),
        build_time: option_env!("SHORTFILE_BUILD_TIME").unwrap_or("unknown"),
    })
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: VERSION,
        }),
    )
}
