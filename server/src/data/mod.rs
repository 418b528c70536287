//! Data storage layer
//!
//! - `files` - Blob storage (filesystem, in-memory)
//! - `index` - Metadata index (SQLite, in-memory)
//! - `repository` - Dual-store file repository over both

pub mod files;
pub mod index;
pub mod repository;

pub use files::{BlobStore, FilesystemBlobStore, InMemoryBlobStore};
pub use index::{InMemoryIndex, IndexBackend, IndexError, MetadataIndex, SqliteIndex};
pub use repository::{FileRecord, FileRepository, RepositoryError, StoredFile, UploadRecord};

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::config::IndexBackendKind;
use crate::core::constants::INDEX_DB_FILENAME;
use crate::core::storage::{AppStorage, DataSubdir};

/// Metadata index service
///
/// Wraps the configured index backend. Stored as Arc so the backend can be
/// shared with the repository and with background tasks.
pub enum IndexService {
    /// Ephemeral, lost on restart
    Memory(Arc<InMemoryIndex>),
    /// SQLite file under the data directory (default)
    Sqlite(Arc<SqliteIndex>),
}

impl IndexService {
    pub async fn init(kind: IndexBackendKind, storage: &AppStorage) -> Result<Self, IndexError> {
        match kind {
            IndexBackendKind::Memory => {
                tracing::warn!("Using in-memory index; uploads are forgotten on restart");
                Ok(Self::Memory(Arc::new(InMemoryIndex::new())))
            }
            IndexBackendKind::Sqlite => {
                let path = storage.subdir(DataSubdir::Index).join(INDEX_DB_FILENAME);
                let index = SqliteIndex::open(&path).await?;
                Ok(Self::Sqlite(Arc::new(index)))
            }
        }
    }

    pub fn backend(&self) -> Arc<dyn IndexBackend> {
        match self {
            Self::Memory(index) => index.clone(),
            Self::Sqlite(index) => index.clone(),
        }
    }

    /// Start backend maintenance tasks (WAL checkpointing for SQLite)
    pub fn start_background_tasks(
        &self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        match self {
            Self::Memory(_) => None,
            Self::Sqlite(index) => Some(index.start_checkpoint_task(shutdown_rx)),
        }
    }
}

/// Build a repository over the given blob root and index
pub async fn open_repository(
    storage: &AppStorage,
    index: &IndexService,
) -> Result<FileRepository, RepositoryError> {
    let blobs = FilesystemBlobStore::init(storage.files_dir().to_path_buf()).await?;
    Ok(FileRepository::new(
        Arc::new(blobs),
        MetadataIndex::new(index.backend()),
    ))
}
