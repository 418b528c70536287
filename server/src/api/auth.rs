//! Owner-key authorization for mutating routes

use axum::http::{HeaderMap, header};

use super::types::ApiError;
use crate::core::OwnerKey;
use crate::utils::crypto::constant_time_eq;

/// Require the `authorization` header to equal the owner key
///
/// The raw header value is compared; no scheme prefix is stripped.
pub fn authorize_owner(headers: &HeaderMap, key: &OwnerKey) -> Result<(), ApiError> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if key.is_empty() || !constant_time_eq(presented, key.expose()) {
        tracing::debug!(
            has_header = headers.contains_key(header::AUTHORIZATION),
            "Owner key rejected"
        );
        return Err(ApiError::unauthorized("not authorized"));
    }
    Ok(())
}
