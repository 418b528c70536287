//! Blob store trait definition
//!
//! A flat, name-addressed byte store rooted at a single directory.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::error::BlobStoreError;

/// Longest accepted blob name in bytes
pub const MAX_NAME_LEN: usize = 255;

/// Lazy reader over a stored blob
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Writer for a new blob. Callers must `shutdown()` it to finish the write.
pub type BlobWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Trait for blob store backends
///
/// Implementations must be thread-safe (Send + Sync); one instance is shared
/// across all request tasks.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create a blob for writing
    ///
    /// # Arguments
    /// * `name` - Blob name, validated with [`validate_name`]
    ///
    /// # Notes
    /// An existing blob with the same name is truncated and overwritten.
    async fn create(&self, name: &str) -> Result<BlobWriter, BlobStoreError>;

    /// Open a blob for reading
    ///
    /// # Returns
    /// A streaming reader or `NotFound`
    async fn open(&self, name: &str) -> Result<BlobReader, BlobStoreError>;

    /// Check whether a blob exists
    async fn stat(&self, name: &str) -> Result<bool, BlobStoreError>;

    /// Remove a blob
    ///
    /// # Notes
    /// Removing an absent blob succeeds.
    async fn remove(&self, name: &str) -> Result<(), BlobStoreError>;

    /// Names of all stored blobs
    async fn list(&self) -> Result<Vec<String>, BlobStoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Validate a blob name
///
/// Names are single path components: non-empty, at most [`MAX_NAME_LEN`]
/// bytes, no `/` or `\`, no NUL, and not `.` or `..`.
pub fn validate_name(name: &str) -> Result<(), BlobStoreError> {
    let invalid = name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(BlobStoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
