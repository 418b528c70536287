//! In-memory blob store
//!
//! Holds blobs in a locked map. Used by tests and by the HTTP router tests.
//! A blob becomes visible (empty) on `create` and receives its contents when
//! the writer is shut down.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::io::AsyncWrite;

use super::error::BlobStoreError;
use super::storage::{BlobReader, BlobStore, BlobWriter, validate_name};

type BlobMap = Arc<RwLock<BTreeMap<String, Bytes>>>;

/// In-memory blob store
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: BlobMap,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a blob's committed contents
    pub fn contents(&self, name: &str) -> Option<Bytes> {
        self.blobs.read().get(name).cloned()
    }

    /// Insert a blob directly, bypassing the writer
    pub fn insert(&self, name: &str, data: impl Into<Bytes>) {
        self.blobs.write().insert(name.to_string(), data.into());
    }
}

/// Buffers writes and commits them on shutdown
struct MemoryWriter {
    name: String,
    buf: Vec<u8>,
    blobs: BlobMap,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.get_mut().buf.extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let data = Bytes::from(std::mem::take(&mut this.buf));
        this.blobs.write().insert(this.name.clone(), data);
        Poll::Ready(Ok(()))
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn create(&self, name: &str) -> Result<BlobWriter, BlobStoreError> {
        validate_name(name)?;
        self.blobs.write().insert(name.to_string(), Bytes::new());
        Ok(Box::new(MemoryWriter {
            name: name.to_string(),
            buf: Vec::new(),
            blobs: self.blobs.clone(),
        }))
    }

    async fn open(&self, name: &str) -> Result<BlobReader, BlobStoreError> {
        validate_name(name)?;
        let data = self
            .contents(name)
            .ok_or_else(|| BlobStoreError::NotFound(name.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn stat(&self, name: &str) -> Result<bool, BlobStoreError> {
        validate_name(name)?;
        Ok(self.blobs.read().contains_key(name))
    }

    async fn remove(&self, name: &str) -> Result<(), BlobStoreError> {
        validate_name(name)?;
        self.blobs.write().remove(name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, BlobStoreError> {
        Ok(self.blobs.read().keys().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
