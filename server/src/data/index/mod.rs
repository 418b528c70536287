//! Metadata index
//!
//! Key-value mapping from short identifier to a serialized record.
//!
//! ## Architecture
//!
//! ```text
//! MetadataIndex<T> (typed, MessagePack)
//!       |
//!       v
//! IndexBackend (raw bytes)
//!   - InMemoryIndex (dashmap)
//!   - SqliteIndex (sqlx, WAL)
//! ```
//!
//! A missing key is `Ok(None)`, never an error.

mod backend;
mod error;
mod memory;
mod migrations;
mod schema;
mod sqlite;

pub use backend::IndexBackend;
pub use error::IndexError;
pub use memory::InMemoryIndex;
pub use sqlite::SqliteIndex;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Typed view over an [`IndexBackend`]
pub struct MetadataIndex<T> {
    backend: Arc<dyn IndexBackend>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for MetadataIndex<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for MetadataIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataIndex")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl<T> MetadataIndex<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(backend: Arc<dyn IndexBackend>) -> Self {
        Self {
            backend,
            _record: PhantomData,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    // ========================================================================
    // Typed API
    // ========================================================================

    /// Get and decode the record for a key
    pub async fn get(&self, key: &str) -> Result<Option<T>, IndexError> {
        match self.backend.get(key).await? {
            Some(bytes) => {
                let record = rmp_serde::from_slice(&bytes)
                    .map_err(|e| IndexError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Encode and store a record, replacing any previous value
    pub async fn set(&self, key: &str, record: &T) -> Result<(), IndexError> {
        let bytes =
            rmp_serde::to_vec_named(record).map_err(|e| IndexError::Serialization(e.to_string()))?;
        self.backend.set(key, bytes).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), IndexError> {
        self.backend.delete(key).await
    }

    pub async fn keys(&self) -> Result<Vec<String>, IndexError> {
        self.backend.keys().await
    }

    pub async fn close(&self) -> Result<(), IndexError> {
        self.backend.close().await
    }
}
