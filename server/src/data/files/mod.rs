//! Blob storage
//!
//! Name-addressed byte storage behind the [`BlobStore`] trait. The filesystem
//! backend is used by the server; the in-memory backend by tests.

mod error;
mod filesystem;
mod memory;
mod storage;

pub use error::BlobStoreError;
pub use filesystem::FilesystemBlobStore;
pub use memory::InMemoryBlobStore;
pub use storage::{BlobReader, BlobStore, BlobWriter, MAX_NAME_LEN, validate_name};
