//! Schema versioning for the SQLite index
//!
//! Version 1 is the initial schema. Later versions are applied in order
//! inside a transaction and recorded with a checksum of their SQL.

use sqlx::SqlitePool;

use super::error::IndexError;
use super::schema::{SCHEMA, SCHEMA_VERSION};
use crate::utils::crypto::sha256_hex;

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), IndexError> {
    let initialized: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await?;

    if !initialized {
        tracing::debug!(version = SCHEMA_VERSION, "Initializing index schema");
        return apply(pool, SCHEMA_VERSION, "initial_schema", SCHEMA).await;
    }

    let current: i32 = sqlx::query_scalar("SELECT version FROM schema_version WHERE id = 1")
        .fetch_optional(pool)
        .await?
        .unwrap_or(0);

    if current > SCHEMA_VERSION {
        return Err(IndexError::Migration {
            version: current,
            error: format!(
                "index was written by a newer release (schema v{}, supported v{})",
                current, SCHEMA_VERSION
            ),
        });
    }

    for version in (current + 1)..=SCHEMA_VERSION {
        match version {
            1 => apply(pool, 1, "initial_schema", SCHEMA).await?,
            _ => {
                return Err(IndexError::Migration {
                    version,
                    error: "unknown migration".to_string(),
                });
            }
        }
    }

    tracing::debug!(version = SCHEMA_VERSION, "Index schema is up to date");
    Ok(())
}

async fn apply(pool: &SqlitePool, version: i32, name: &str, sql: &str) -> Result<(), IndexError> {
    let start = std::time::Instant::now();
    let mut tx = pool.begin().await?;

    sqlx::query(sql)
        .execute(&mut *tx)
        .await
        .map_err(|e| IndexError::Migration {
            version,
            error: e.to_string(),
        })?;

    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO schema_version (id, version, applied_at, description) VALUES (1, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET version = excluded.version,
             applied_at = excluded.applied_at, description = excluded.description",
    )
    .bind(version)
    .bind(now)
    .bind(name)
    .execute(&mut *tx)
    .await?;

    let elapsed_ms = start.elapsed().as_millis() as i64;
    sqlx::query(
        "INSERT OR REPLACE INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(version)
    .bind(name)
    .bind(now)
    .bind(sha256_hex(sql))
    .bind(elapsed_ms)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::debug!(version, name, elapsed_ms, "Applied index migration");
    Ok(())
}
