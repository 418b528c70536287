//! Metadata index error types

use thiserror::Error;

/// Errors from metadata index operations
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration v{version} failed: {error}")]
    Migration { version: i32, error: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(IndexError::Closed.to_string(), "Index is closed");
        assert_eq!(
            IndexError::InvalidArgument("empty key".to_string()).to_string(),
            "Invalid argument: empty key"
        );
        let err = IndexError::Migration {
            version: 2,
            error: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Migration v2 failed: boom");
    }
}
