//! Filesystem-based blob store
//!
//! Blobs are plain files directly under the root: `{root}/{name}`.
//!
//! Names map to file names unchanged. On a case-insensitive filesystem
//! (default macOS and Windows volumes) `abc.txt` and `ABC.txt` are the same
//! file, so identifiers differing only in case overwrite each other. Keep
//! the root on a case-sensitive volume; `init` warns when it is not.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::BlobStoreError;
use super::storage::{BlobReader, BlobStore, BlobWriter, validate_name};

/// Filesystem-based blob store
#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    /// Open a store rooted at `root`, creating the directory if absent
    pub async fn init(root: PathBuf) -> Result<Self, BlobStoreError> {
        fs::create_dir_all(&root).await?;
        if folds_case(&root).await? {
            tracing::warn!(
                root = %root.display(),
                "Blob directory is case-insensitive; ids differing only in case will collide"
            );
        }
        tracing::debug!(root = %root.display(), "Blob store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Resolve a validated name to a path inside the root
    fn blob_path(&self, name: &str) -> Result<PathBuf, BlobStoreError> {
        validate_name(name)?;
        let path = self.root.join(name);
        // A single validated component can only resolve to a direct child
        if path.parent() != Some(self.root.as_path()) {
            return Err(BlobStoreError::InvalidName(name.to_string()));
        }
        Ok(path)
    }
}

/// Create a lowercase marker and look it up in uppercase
async fn folds_case(root: &Path) -> Result<bool, BlobStoreError> {
    let marker = root.join(".case-check");
    fs::write(&marker, b"").await?;
    let folded = fs::metadata(root.join(".CASE-CHECK")).await.is_ok();
    fs::remove_file(&marker).await?;
    Ok(folded)
}

fn not_found_or_io(e: std::io::Error, name: &str) -> BlobStoreError {
    if e.kind() == std::io::ErrorKind::NotFound {
        BlobStoreError::NotFound(name.to_string())
    } else {
        BlobStoreError::Io(e)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn create(&self, name: &str) -> Result<BlobWriter, BlobStoreError> {
        let path = self.blob_path(name)?;
        let file = fs::File::create(&path).await?;
        tracing::trace!(name, path = %path.display(), "Blob created");
        Ok(Box::new(file))
    }

    async fn open(&self, name: &str) -> Result<BlobReader, BlobStoreError> {
        let path = self.blob_path(name)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| not_found_or_io(e, name))?;
        Ok(Box::new(file))
    }

    async fn stat(&self, name: &str) -> Result<bool, BlobStoreError> {
        let path = self.blob_path(name)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobStoreError::Io(e)),
        }
    }

    async fn remove(&self, name: &str) -> Result<(), BlobStoreError> {
        let path = self.blob_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(name, "Blob removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobStoreError::Io(e)),
        }
    }

    async fn list(&self) -> Result<Vec<String>, BlobStoreError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::warn!(name = ?raw, "Skipping non-UTF-8 blob name"),
            }
        }
        names.sort();
        Ok(names)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
