//! SQLite index backend
//!
//! Durable key-value table in a single SQLite file:
//! - WAL mode so reads proceed during writes
//! - `INSERT .. ON CONFLICT DO UPDATE` for last-write-wins
//! - periodic WAL checkpointing until shutdown

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::ConnectOptions;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::log::LevelFilter;

use super::backend::{IndexBackend, check_key};
use super::error::IndexError;
use super::migrations;
use crate::core::constants::{
    SQLITE_BUSY_TIMEOUT_SECS, SQLITE_CHECKPOINT_INTERVAL_SECS, SQLITE_MAX_CONNECTIONS,
};

/// SQLite index backend
pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    /// Open (or create) the index database at `path` and run migrations
    pub async fn open(path: &Path) -> Result<Self, IndexError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))
            .pragma("temp_store", "MEMORY")
            .log_statements(LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        tracing::debug!(path = %path.display(), "SQLite index opened");
        Ok(Self { pool })
    }

    fn ensure_open(&self) -> Result<(), IndexError> {
        if self.pool.is_closed() {
            return Err(IndexError::Closed);
        }
        Ok(())
    }

    pub async fn checkpoint(&self) -> Result<(), IndexError> {
        self.ensure_open()?;
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        tracing::trace!("WAL checkpoint completed");
        Ok(())
    }

    /// Checkpoint the WAL periodically until shutdown is signalled
    pub fn start_checkpoint_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let index = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(SQLITE_CHECKPOINT_INTERVAL_SECS));
            // First tick fires immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("WAL checkpoint task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        if let Err(e) = index.checkpoint().await {
                            tracing::warn!("WAL checkpoint failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl IndexBackend for SqliteIndex {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        self.ensure_open()?;
        check_key(key)?;
        let value = sqlx::query_scalar::<_, Vec<u8>>("SELECT value FROM file_index WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), IndexError> {
        self.ensure_open()?;
        check_key(key)?;
        sqlx::query(
            "INSERT INTO file_index (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), IndexError> {
        self.ensure_open()?;
        check_key(key)?;
        sqlx::query("DELETE FROM file_index WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, IndexError> {
        self.ensure_open()?;
        let keys = sqlx::query_scalar::<_, String>("SELECT key FROM file_index ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    async fn close(&self) -> Result<(), IndexError> {
        if self.pool.is_closed() {
            return Ok(());
        }
        if let Err(e) = self.checkpoint().await {
            tracing::warn!("SQLite checkpoint before close failed: {}", e);
        }
        self.pool.close().await;
        tracing::debug!("SQLite index closed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
