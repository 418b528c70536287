//! File repository error types

use thiserror::Error;

use crate::data::files::BlobStoreError;
use crate::data::index::IndexError;

/// Errors from file repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File already exists: {short_id}")]
    AlreadyExists { short_id: String },

    #[error("File not found: {short_id}")]
    NotFound { short_id: String },

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobStoreError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

impl RepositoryError {
    pub(crate) fn not_found(short_id: &str) -> Self {
        Self::NotFound {
            short_id: short_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepositoryError::AlreadyExists {
            short_id: "abc".into(),
        };
        assert_eq!(err.to_string(), "File already exists: abc");
        assert_eq!(
            RepositoryError::not_found("x").to_string(),
            "File not found: x"
        );
    }

    #[test]
    fn test_from_layer_errors() {
        let err: RepositoryError = IndexError::Closed.into();
        assert!(matches!(err, RepositoryError::Index(IndexError::Closed)));

        let err: RepositoryError = BlobStoreError::NotFound("a".into()).into();
        assert_eq!(err.to_string(), "Blob store error: Blob not found: a");
    }
}
