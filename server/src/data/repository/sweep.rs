//! Orphan detection and cleanup
//!
//! Finds blobs that no index entry points at and index entries whose blob is
//! gone. Uploads in flight look like orphan blobs, so sweeping is meant to run
//! while the server is stopped.

use std::collections::HashSet;

use serde::Serialize;

use super::{FileRepository, RepositoryError};

/// Inconsistencies between the index and the blob store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    /// Blob names with no index entry
    pub orphan_blobs: Vec<String>,
    /// Identifiers whose blob is missing
    pub dangling_ids: Vec<String>,
}

impl OrphanReport {
    pub fn is_clean(&self) -> bool {
        self.orphan_blobs.is_empty() && self.dangling_ids.is_empty()
    }
}

impl FileRepository {
    /// Compare the index against the blob store
    pub async fn find_orphans(&self) -> Result<OrphanReport, RepositoryError> {
        let mut referenced = HashSet::new();
        let mut dangling_ids = Vec::new();

        for short_id in self.index.keys().await? {
            let Some(record) = self.index.get(&short_id).await? else {
                continue;
            };
            if record.name.is_empty() || !self.blobs.stat(&record.name).await? {
                dangling_ids.push(short_id);
            } else {
                referenced.insert(record.name);
            }
        }

        let orphan_blobs = self
            .blobs
            .list()
            .await?
            .into_iter()
            .filter(|name| !referenced.contains(name))
            .collect();

        Ok(OrphanReport {
            orphan_blobs,
            dangling_ids,
        })
    }

    /// Remove orphan blobs and dangling index entries
    ///
    /// With `dry_run` nothing is removed. Returns what was (or would be) removed.
    pub async fn sweep(&self, dry_run: bool) -> Result<OrphanReport, RepositoryError> {
        let report = self.find_orphans().await?;
        if dry_run || report.is_clean() {
            return Ok(report);
        }

        for name in &report.orphan_blobs {
            self.blobs.remove(name).await?;
        }
        for short_id in &report.dangling_ids {
            self.index.delete(short_id).await?;
        }

        tracing::info!(
            blobs = report.orphan_blobs.len(),
            entries = report.dangling_ids.len(),
            "Sweep removed orphans"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use crate::data::files::{BlobStore, InMemoryBlobStore};
    use crate::data::index::{InMemoryIndex, MetadataIndex};
    use crate::data::repository::{FileRecord, UploadRecord};

    async fn seeded() -> (FileRepository, InMemoryBlobStore, MetadataIndex<FileRecord>) {
        let blobs = InMemoryBlobStore::new();
        let index = MetadataIndex::new(Arc::new(InMemoryIndex::new()));
        let repo = FileRepository::new(Arc::new(blobs.clone()), index.clone());

        let record = FileRecord {
            name: "ok.txt".into(),
            short_id: "ok".into(),
            content_type: "text/plain".into(),
        };
        repo.set(UploadRecord::new(record, Cursor::new(b"fine".to_vec())))
            .await
            .unwrap();

        // blob with no record
        blobs.insert("stray.png", &b"x"[..]);
        // record with no blob
        index
            .set(
                "ghost",
                &FileRecord {
                    name: "ghost.txt".into(),
                    short_id: "ghost".into(),
                    content_type: "text/plain".into(),
                },
            )
            .await
            .unwrap();

        (repo, blobs, index)
    }

    #[tokio::test]
    async fn test_find_orphans() {
        let (repo, _, _) = seeded().await;
        let report = repo.find_orphans().await.unwrap();
        assert_eq!(report.orphan_blobs, vec!["stray.png"]);
        assert_eq!(report.dangling_ids, vec!["ghost"]);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_dry_run_keeps_everything() {
        let (repo, blobs, index) = seeded().await;
        let report = repo.sweep(true).await.unwrap();
        assert!(!report.is_clean());
        assert!(blobs.stat("stray.png").await.unwrap());
        assert!(index.get("ghost").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_removes_orphans() {
        let (repo, blobs, index) = seeded().await;
        repo.sweep(false).await.unwrap();

        assert!(blobs.contents("stray.png").is_none());
        assert!(index.get("ghost").await.unwrap().is_none());
        assert!(repo.get("ok").await.is_ok());
        assert!(repo.find_orphans().await.unwrap().is_clean());
    }
}
