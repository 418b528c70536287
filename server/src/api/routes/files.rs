//! Upload, download and delete endpoints
//!
//! Uploads are multipart with a single `file` field. The first bytes are
//! buffered to sniff the content type; the rest is streamed straight into
//! the repository.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::BytesMut;
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::api::auth::authorize_owner;
use crate::api::types::{ApiError, UploadResponse};
use crate::core::OwnerKey;
use crate::core::constants::{MAX_SHORT_ID_LEN, RESERVED_IDS, SNIFF_LEN, UPLOAD_FIELD};
use crate::data::{FileRecord, FileRepository, UploadRecord};
use crate::domain::short_id;
use crate::utils::mime;

/// State for file routes
#[derive(Clone)]
pub struct FilesState {
    pub repository: FileRepository,
    pub owner_key: Arc<OwnerKey>,
}

/// `PUT /` and `PUT /{id}`
///
/// An empty path gets a generated identifier and needs no key; a chosen
/// identifier requires the owner key.
pub async fn upload(
    State(state): State<FilesState>,
    uri: Uri,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let requested = uri.path().trim_start_matches('/');

    let short_id = if requested.is_empty() {
        short_id::generate()
    } else {
        authorize_owner(&headers, &state.owner_key)?;
        check_custom_id(requested)?;
        requested.to_string()
    };

    let short_id = store_upload(&state.repository, short_id, multipart?).await?;
    tracing::info!(short_id, "Upload stored");

    Ok((StatusCode::CREATED, Json(UploadResponse { short_id })).into_response())
}

/// `GET /{id}`: stream the blob with its stored content type
pub async fn download(
    State(state): State<FilesState>,
    Path(short_id): Path<String>,
) -> Result<Response, ApiError> {
    let stored = state.repository.get(&short_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&stored.record.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(mime::OCTET_STREAM)),
    );
    // Identifiers are write-once
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    let body = Body::from_stream(ReaderStream::new(stored.reader));
    Ok((headers, body).into_response())
}

/// `DELETE /{id}`: owner key required, absent ids succeed
pub async fn remove(
    State(state): State<FilesState>,
    Path(short_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize_owner(&headers, &state.owner_key)?;
    state.repository.delete(&short_id).await?;
    tracing::info!(short_id, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Caller-chosen identifiers: not reserved, `[A-Za-z0-9_-]{1,64}`
fn check_custom_id(id: &str) -> Result<(), ApiError> {
    if RESERVED_IDS.contains(&id) {
        return Err(ApiError::bad_request(
            "RESERVED_ID",
            format!("'{id}' is a reserved identifier"),
        ));
    }
    let valid = id.len() <= MAX_SHORT_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if !valid {
        return Err(ApiError::bad_request(
            "INVALID_ID",
            format!("identifiers are 1-{MAX_SHORT_ID_LEN} characters of A-Z, a-z, 0-9, '_' or '-'"),
        ));
    }
    Ok(())
}

async fn store_upload(
    repository: &FileRepository,
    short_id: String,
    mut multipart: Multipart,
) -> Result<String, ApiError> {
    let mut field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| ApiError::from_multipart(&e))?
        {
            Some(field) if field.name() == Some(UPLOAD_FIELD) => break field,
            Some(_) => continue,
            None => {
                return Err(ApiError::bad_request(
                    "MISSING_FILE",
                    format!("multipart field '{UPLOAD_FIELD}' is required"),
                ));
            }
        }
    };

    let mut prefix = BytesMut::new();
    while prefix.len() < SNIFF_LEN {
        match field
            .chunk()
            .await
            .map_err(|e| ApiError::from_multipart(&e))?
        {
            Some(chunk) => prefix.extend_from_slice(&chunk),
            None => break,
        }
    }
    if prefix.is_empty() {
        return Err(ApiError::bad_request("EMPTY_FILE", "file is empty"));
    }

    let content_type = mime::detect(&prefix[..prefix.len().min(SNIFF_LEN)]);
    let name = format!("{short_id}.{}", mime::extension_for(content_type));

    let rest = futures::stream::try_unfold(field, |mut field| async move {
        Ok::<_, MultipartError>(field.chunk().await?.map(|chunk| (chunk, field)))
    })
    .map_err(std::io::Error::other);
    let body = std::io::Cursor::new(prefix.freeze()).chain(StreamReader::new(Box::pin(rest)));

    let record = FileRecord {
        name,
        short_id,
        content_type: content_type.to_string(),
    };
    Ok(repository.set(UploadRecord::new(record, body)).await?)
}
