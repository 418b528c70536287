//! Blob store error types

use thiserror::Error;

/// Errors from blob store operations
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// Name is empty, contains a path separator, or would escape the root
    #[error("Invalid blob name: {0:?}")]
    InvalidName(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlobStoreError::NotFound("abc.png".to_string());
        assert_eq!(err.to_string(), "Blob not found: abc.png");

        let err = BlobStoreError::InvalidName("../x".to_string());
        assert_eq!(err.to_string(), "Invalid blob name: \"../x\"");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BlobStoreError = io.into();
        assert!(matches!(err, BlobStoreError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }
}
