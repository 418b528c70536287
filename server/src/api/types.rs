//! Shared API types
//!
//! Error responses are JSON objects with an `error` message and a machine
//! readable `code`; conflicts also carry the `short_id`.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::data::files::BlobStoreError;
use crate::data::repository::RepositoryError;

/// Successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub short_id: String,
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    Unauthorized { message: String },
    NotFound { message: String },
    Conflict { short_id: String, message: String },
    PayloadTooLarge { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map a multipart body error; body-limit violations become 413
    pub fn from_multipart(e: &MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge {
                message: "Upload exceeds the maximum size".to_string(),
            };
        }
        Self::bad_request("INVALID_MULTIPART", e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        Self::bad_request("INVALID_MULTIPART", e.body_text())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::InvalidArgument(message) => {
                Self::bad_request("INVALID_ARGUMENT", message)
            }
            RepositoryError::AlreadyExists { short_id } => Self::Conflict {
                short_id,
                message: "file already exists".to_string(),
            },
            RepositoryError::NotFound { .. } => Self::not_found("file not found"),
            // A failed read of the request body surfaces as a blob write error
            RepositoryError::Blob(BlobStoreError::Io(io)) => {
                match io
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<MultipartError>())
                {
                    Some(m) => Self::from_multipart(m),
                    None => {
                        tracing::error!(error = %io, "Blob I/O error");
                        Self::internal("Storage operation failed")
                    }
                }
            }
            other => {
                tracing::error!(error = %other, "Repository error");
                Self::internal("Storage operation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest { code, message } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": message, "code": code }),
            ),
            Self::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": message, "code": "UNAUTHORIZED" }),
            ),
            Self::NotFound { message } => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": message, "code": "NOT_FOUND" }),
            ),
            Self::Conflict { short_id, message } => (
                StatusCode::CONFLICT,
                serde_json::json!({ "short_id": short_id, "error": message }),
            ),
            Self::PayloadTooLarge { message } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                serde_json::json!({ "error": message, "code": "PAYLOAD_TOO_LARGE" }),
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": message, "code": "INTERNAL" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
