//! Index backend trait definition

use async_trait::async_trait;

use super::error::IndexError;

/// Key-value backend for the metadata index
///
/// Values are opaque bytes; the typed layer lives in
/// [`MetadataIndex`](super::MetadataIndex). Writes are last-write-wins.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// Get the value for a key, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError>;

    /// Insert or replace the value for a key
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), IndexError>;

    /// Delete a key. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), IndexError>;

    /// All keys, sorted
    async fn keys(&self) -> Result<Vec<String>, IndexError>;

    /// Flush and release the backend. Later calls fail with `Closed`.
    async fn close(&self) -> Result<(), IndexError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Reject empty keys
pub(crate) fn check_key(key: &str) -> Result<(), IndexError> {
    if key.is_empty() {
        return Err(IndexError::InvalidArgument("key must not be empty".into()));
    }
    Ok(())
}
