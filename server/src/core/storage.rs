//! Data directory management
//!
//! ## Platform Paths
//!
//! | Type | Windows | macOS | Linux |
//! |------|---------|-------|-------|
//! | Data | `%APPDATA%\Shortfile\` | `~/Library/Application Support/Shortfile/` | `$XDG_DATA_HOME/shortfile/` |
//!
//! Layout: `{data_dir}/index/index.db` and `{data_dir}/files/*` unless the
//! blob directory is overridden by `storage.path`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::config::AppConfig;
use super::constants::{APP_DOT_FOLDER, APP_NAME, ENV_DATA_DIR};
use crate::utils::file::expand_path;

/// Data subdirectories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSubdir {
    Index,
    Files,
}

impl DataSubdir {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataSubdir::Index => "index",
            DataSubdir::Files => "files",
        }
    }

    pub const fn all() -> &'static [DataSubdir] {
        &[DataSubdir::Index, DataSubdir::Files]
    }
}

/// Application storage manager
#[derive(Debug, Clone)]
pub struct AppStorage {
    data_dir: PathBuf,
    files_dir: PathBuf,
}

impl AppStorage {
    /// Resolve and create the data directory and blob directory
    pub async fn init(config: &AppConfig) -> Result<Self> {
        Self::init_at(Self::resolve_data_dir(), config).await
    }

    async fn init_at(data_dir: PathBuf, config: &AppConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        for subdir in DataSubdir::all() {
            let path = data_dir.join(subdir.as_str());
            tokio::fs::create_dir_all(&path).await.with_context(|| {
                format!(
                    "Failed to create {} directory: {}",
                    subdir.as_str(),
                    path.display()
                )
            })?;
        }

        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);
        let files_dir = match &config.storage.path {
            Some(path) => {
                tokio::fs::create_dir_all(path).await.with_context(|| {
                    format!("Failed to create storage directory: {}", path.display())
                })?;
                path.canonicalize().unwrap_or_else(|_| path.clone())
            }
            None => data_dir.join(DataSubdir::Files.as_str()),
        };

        tracing::debug!(
            data_dir = %data_dir.display(),
            files_dir = %files_dir.display(),
            "Storage initialized"
        );
        Ok(Self {
            data_dir,
            files_dir,
        })
    }

    /// Resolve data directory from env var or platform default
    pub fn resolve_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            return expand_path(&dir);
        }

        if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            return proj_dirs.data_dir().to_path_buf();
        }

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        cwd.join(APP_DOT_FOLDER)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding the blobs
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    pub fn subdir(&self, subdir: DataSubdir) -> PathBuf {
        self.data_dir.join(subdir.as_str())
    }

    /// Create AppStorage for testing with a specific data directory
    #[cfg(test)]
    pub fn init_for_test(data_dir: PathBuf) -> Self {
        let files_dir = data_dir.join(DataSubdir::Files.as_str());
        Self {
            data_dir,
            files_dir,
        }
    }
}
