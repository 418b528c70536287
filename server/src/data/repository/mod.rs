//! File repository
//!
//! Binds a short identifier to a metadata record in the index and a content
//! blob in the blob store. The repository is the only writer of both.
//!
//! Writes go blob first, then index, so a reader never sees a record whose
//! blob has not been written. The existence check in [`FileRepository::set`]
//! is not atomic with the write: two concurrent uploads of the same
//! identifier can both pass it, and the last writer wins.

mod error;
mod sweep;

pub use error::RepositoryError;
pub use sweep::OrphanReport;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::data::files::{BlobReader, BlobStore, BlobStoreError, BlobWriter};
use crate::data::index::MetadataIndex;

/// Metadata stored in the index for each identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Blob name: identifier plus canonical extension
    pub name: String,
    pub short_id: String,
    pub content_type: String,
}

/// A pending upload: the record to index plus the body to store
pub struct UploadRecord<R> {
    pub record: FileRecord,
    pub body: R,
}

impl<R> UploadRecord<R> {
    pub fn new(record: FileRecord, body: R) -> Self {
        Self { record, body }
    }
}

/// A stored file ready to be streamed
pub struct StoredFile {
    pub record: FileRecord,
    pub reader: BlobReader,
}

impl std::fmt::Debug for StoredFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredFile")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

/// Dual-store file repository
#[derive(Clone)]
pub struct FileRepository {
    blobs: Arc<dyn BlobStore>,
    index: MetadataIndex<FileRecord>,
}

impl std::fmt::Debug for FileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRepository")
            .field("blobs", &self.blobs.backend_name())
            .field("index", &self.index.backend_name())
            .finish()
    }
}

impl FileRepository {
    pub fn new(blobs: Arc<dyn BlobStore>, index: MetadataIndex<FileRecord>) -> Self {
        Self { blobs, index }
    }

    /// Store an upload under its identifier
    ///
    /// # Returns
    /// The identifier, or `AlreadyExists` if it is already indexed
    ///
    /// # Notes
    /// On failure after the blob was created, the blob is removed on a
    /// best-effort basis. A cancelled upload leaves its partial blob for the
    /// sweeper.
    pub async fn set<R>(&self, upload: UploadRecord<R>) -> Result<String, RepositoryError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let UploadRecord { record, mut body } = upload;
        check_id(&record.short_id)?;
        if record.name.is_empty() {
            return Err(RepositoryError::InvalidArgument(
                "blob name must not be empty".into(),
            ));
        }

        if self.index.get(&record.short_id).await?.is_some() {
            return Err(RepositoryError::AlreadyExists {
                short_id: record.short_id,
            });
        }

        let mut writer = self.blobs.create(&record.name).await?;
        let size = match write_body(&mut body, &mut writer).await {
            Ok(size) => size,
            Err(e) => {
                drop(writer);
                self.discard_blob(&record.name).await;
                return Err(BlobStoreError::Io(e).into());
            }
        };

        if let Err(e) = self.index.set(&record.short_id, &record).await {
            self.discard_blob(&record.name).await;
            return Err(e.into());
        }

        tracing::debug!(
            short_id = %record.short_id,
            name = %record.name,
            content_type = %record.content_type,
            size,
            "File stored"
        );
        Ok(record.short_id)
    }

    /// Look up an identifier and open its blob
    ///
    /// A record without a blob is reported as `NotFound`.
    pub async fn get(&self, short_id: &str) -> Result<StoredFile, RepositoryError> {
        check_id(short_id)?;

        let record = self
            .index
            .get(short_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(short_id))?;

        if record.name.is_empty() {
            return Err(RepositoryError::not_found(short_id));
        }

        if !self.blobs.stat(&record.name).await? {
            tracing::warn!(short_id, name = %record.name, "Index entry has no blob");
            return Err(RepositoryError::not_found(short_id));
        }

        let reader = match self.blobs.open(&record.name).await {
            Ok(reader) => reader,
            Err(BlobStoreError::NotFound(_)) => return Err(RepositoryError::not_found(short_id)),
            Err(e) => return Err(e.into()),
        };

        Ok(StoredFile { record, reader })
    }

    /// Remove an identifier's blob, then its index entry
    ///
    /// Deleting an unknown identifier succeeds.
    pub async fn delete(&self, short_id: &str) -> Result<(), RepositoryError> {
        check_id(short_id)?;

        let Some(record) = self.index.get(short_id).await? else {
            return Ok(());
        };

        if !record.name.is_empty() {
            self.blobs.remove(&record.name).await?;
        }
        self.index.delete(short_id).await?;

        tracing::debug!(short_id, name = %record.name, "File deleted");
        Ok(())
    }

    /// All indexed identifiers
    pub async fn identifiers(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.index.keys().await?)
    }

    pub async fn close(&self) -> Result<(), RepositoryError> {
        self.index.close().await?;
        tracing::debug!(backend = self.index.backend_name(), "Repository closed");
        Ok(())
    }

    async fn discard_blob(&self, name: &str) {
        if let Err(e) = self.blobs.remove(name).await {
            tracing::warn!(name, error = %e, "Failed to remove partial blob");
        }
    }
}

fn check_id(short_id: &str) -> Result<(), RepositoryError> {
    if short_id.is_empty() {
        return Err(RepositoryError::InvalidArgument(
            "identifier must not be empty".into(),
        ));
    }
    Ok(())
}

async fn write_body<R>(body: &mut R, writer: &mut BlobWriter) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin + Send,
{
    let size = tokio::io::copy(body, writer).await?;
    writer.shutdown().await?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, ReadBuf};
    use tokio::sync::Barrier;

    use crate::data::files::{FilesystemBlobStore, InMemoryBlobStore};
    use crate::data::index::{InMemoryIndex, IndexBackend, IndexError, SqliteIndex};

    fn record(short_id: &str, ext: &str, content_type: &str) -> FileRecord {
        FileRecord {
            name: format!("{}.{}", short_id, ext),
            short_id: short_id.to_string(),
            content_type: content_type.to_string(),
        }
    }

    fn upload(record: FileRecord, data: &'static [u8]) -> UploadRecord<Cursor<&'static [u8]>> {
        UploadRecord::new(record, Cursor::new(data))
    }

    fn memory_repository() -> (FileRepository, InMemoryBlobStore, Arc<InMemoryIndex>) {
        let blobs = InMemoryBlobStore::new();
        let index = Arc::new(InMemoryIndex::new());
        let repo = FileRepository::new(
            Arc::new(blobs.clone()),
            MetadataIndex::new(index.clone()),
        );
        (repo, blobs, index)
    }

    async fn read_all(mut file: StoredFile) -> Vec<u8> {
        let mut buf = Vec::new();
        file.reader.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let (repo, _, _) = memory_repository();
        let rec = record("abc123", "png", "image/png");

        let id = repo.set(upload(rec.clone(), b"0123456789")).await.unwrap();
        assert_eq!(id, "abc123");

        let stored = repo.get("abc123").await.unwrap();
        assert_eq!(stored.record, rec);
        assert_eq!(read_all(stored).await, b"0123456789");
    }

    #[tokio::test]
    async fn test_blob_stored_under_name() {
        let (repo, blobs, _) = memory_repository();
        repo.set(upload(record("k1", "txt", "text/plain"), b"hi"))
            .await
            .unwrap();
        assert!(blobs.contents("k1.txt").is_some());
        assert!(blobs.contents("k1").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_set_does_not_clobber() {
        let (repo, blobs, _) = memory_repository();
        repo.set(upload(record("dup", "bin", "application/octet-stream"), b"first"))
            .await
            .unwrap();

        let err = repo
            .set(upload(record("dup", "bin", "application/octet-stream"), b"second"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists { ref short_id } if short_id == "dup"));
        assert_eq!(&blobs.contents("dup.bin").unwrap()[..], b"first");
    }

    #[tokio::test]
    async fn test_get_unknown() {
        let (repo, _, _) = memory_repository();
        assert!(matches!(
            repo.get("missing").await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_record_without_blob() {
        let (repo, blobs, _) = memory_repository();
        repo.set(upload(record("lost", "txt", "text/plain"), b"x"))
            .await
            .unwrap();
        blobs.remove("lost.txt").await.unwrap();

        assert!(matches!(
            repo.get("lost").await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_record_with_empty_name() {
        let (repo, _, index) = memory_repository();
        let typed: MetadataIndex<FileRecord> = MetadataIndex::new(index);
        let mut rec = record("blank", "txt", "text/plain");
        rec.name.clear();
        typed.set("blank", &rec).await.unwrap();

        assert!(matches!(
            repo.get("blank").await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let (repo, blobs, _) = memory_repository();
        repo.set(upload(record("del", "txt", "text/plain"), b"bye"))
            .await
            .unwrap();

        repo.delete("del").await.unwrap();
        assert!(blobs.contents("del.txt").is_none());
        assert!(matches!(
            repo.get("del").await,
            Err(RepositoryError::NotFound { .. })
        ));
        repo.delete("del").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_absent() {
        let (repo, _, _) = memory_repository();
        repo.delete("never").await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_identifier() {
        let (repo, _, _) = memory_repository();
        assert!(matches!(
            repo.get("").await,
            Err(RepositoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.set(upload(record("", "txt", "text/plain"), b"x")).await,
            Err(RepositoryError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_identifiers_and_close() {
        let (repo, _, _) = memory_repository();
        repo.set(upload(record("b", "txt", "text/plain"), b"1"))
            .await
            .unwrap();
        repo.set(upload(record("a", "txt", "text/plain"), b"2"))
            .await
            .unwrap();
        assert_eq!(repo.identifiers().await.unwrap(), vec!["a", "b"]);

        repo.close().await.unwrap();
        assert!(matches!(
            repo.get("a").await,
            Err(RepositoryError::Index(IndexError::Closed))
        ));
    }

    #[tokio::test]
    async fn test_filesystem_round_trip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blobs = FilesystemBlobStore::init(temp_dir.path().join("files"))
            .await
            .unwrap();
        let repo = FileRepository::new(
            Arc::new(blobs),
            MetadataIndex::new(Arc::new(InMemoryIndex::new())),
        );

        repo.set(upload(record("fs", "pdf", "application/pdf"), b"%PDF-1.7"))
            .await
            .unwrap();
        assert!(temp_dir.path().join("files").join("fs.pdf").is_file());
        assert_eq!(read_all(repo.get("fs").await.unwrap()).await, b"%PDF-1.7");
    }

    async fn persistent_repository(root: &std::path::Path) -> FileRepository {
        let blobs = FilesystemBlobStore::init(root.join("files")).await.unwrap();
        let index = SqliteIndex::open(&root.join("index.db")).await.unwrap();
        FileRepository::new(Arc::new(blobs), MetadataIndex::new(Arc::new(index)))
    }

    #[tokio::test]
    async fn test_sqlite_filesystem_lifecycle() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blob_path = temp_dir.path().join("files").join("report.pdf");
        let rec = record("report", "pdf", "application/pdf");

        let repo = persistent_repository(temp_dir.path()).await;
        repo.set(upload(rec.clone(), b"%PDF-1.7 body"))
            .await
            .unwrap();
        repo.close().await.unwrap();

        // a fresh process sees the same record and bytes
        let repo = persistent_repository(temp_dir.path()).await;
        let stored = repo.get("report").await.unwrap();
        assert_eq!(stored.record, rec);
        assert_eq!(read_all(stored).await, b"%PDF-1.7 body");
        assert!(blob_path.is_file());

        repo.delete("report").await.unwrap();
        assert!(!blob_path.exists());
        assert!(matches!(
            repo.get("report").await,
            Err(RepositoryError::NotFound { .. })
        ));
        repo.close().await.unwrap();
    }

    /// Reader that fails after yielding some bytes
    struct FailingReader {
        sent: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            let this = self.get_mut();
            if this.sent {
                return Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "client went away",
                )));
            }
            this.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_copy_failure_removes_partial_blob() {
        let (repo, blobs, _) = memory_repository();
        let result = repo
            .set(UploadRecord::new(
                record("broken", "bin", "application/octet-stream"),
                FailingReader { sent: false },
            ))
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::Blob(BlobStoreError::Io(_)))
        ));
        assert!(blobs.contents("broken.bin").is_none());
        assert!(matches!(
            repo.get("broken").await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    /// Index whose writes always fail
    #[derive(Default)]
    struct ReadOnlyIndex {
        inner: InMemoryIndex,
    }

    #[async_trait]
    impl IndexBackend for ReadOnlyIndex {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
            self.inner.get(key).await
        }
        async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), IndexError> {
            Err(IndexError::Io(std::io::Error::other("disk full")))
        }
        async fn delete(&self, key: &str) -> Result<(), IndexError> {
            self.inner.delete(key).await
        }
        async fn keys(&self) -> Result<Vec<String>, IndexError> {
            self.inner.keys().await
        }
        async fn close(&self) -> Result<(), IndexError> {
            self.inner.close().await
        }
        fn backend_name(&self) -> &'static str {
            "read-only"
        }
    }

    #[tokio::test]
    async fn test_index_failure_removes_blob() {
        let blobs = InMemoryBlobStore::new();
        let repo = FileRepository::new(
            Arc::new(blobs.clone()),
            MetadataIndex::new(Arc::new(ReadOnlyIndex::default())),
        );

        let result = repo
            .set(upload(record("orphan", "txt", "text/plain"), b"data"))
            .await;
        assert!(matches!(result, Err(RepositoryError::Index(_))));
        assert!(blobs.contents("orphan.txt").is_none());
    }

    /// Index whose first two lookups wait for each other
    struct GatedIndex {
        inner: InMemoryIndex,
        gate: Barrier,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl IndexBackend for GatedIndex {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
            let value = self.inner.get(key).await?;
            if self.lookups.fetch_add(1, Ordering::SeqCst) < 2 {
                self.gate.wait().await;
            }
            Ok(value)
        }
        async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), IndexError> {
            self.inner.set(key, value).await
        }
        async fn delete(&self, key: &str) -> Result<(), IndexError> {
            self.inner.delete(key).await
        }
        async fn keys(&self) -> Result<Vec<String>, IndexError> {
            self.inner.keys().await
        }
        async fn close(&self) -> Result<(), IndexError> {
            self.inner.close().await
        }
        fn backend_name(&self) -> &'static str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_concurrent_set_same_id_races() {
        let blobs = InMemoryBlobStore::new();
        let repo = FileRepository::new(
            Arc::new(blobs.clone()),
            MetadataIndex::new(Arc::new(GatedIndex {
                inner: InMemoryIndex::new(),
                gate: Barrier::new(2),
                lookups: AtomicUsize::new(0),
            })),
        );
        let rec = record("race", "bin", "application/octet-stream");

        // Both lookups complete before either write starts, so both pass
        let (first, second) = tokio::join!(
            repo.set(upload(rec.clone(), b"payload-one")),
            repo.set(upload(rec.clone(), b"payload-two")),
        );
        assert_eq!(first.unwrap(), "race");
        assert_eq!(second.unwrap(), "race");

        // One blob survives; whichever write finished last
        let stored = blobs.contents("race.bin").unwrap();
        assert!(&stored[..] == b"payload-one" || &stored[..] == b"payload-two");
        assert_eq!(read_all(repo.get("race").await.unwrap()).await, &stored[..]);
    }
}
