use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_FAVICON, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_SIZE,
    DEFAULT_PORT,
};

// =============================================================================
// Index Backend Enum
// =============================================================================

/// Metadata index backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackendKind {
    #[default]
    Sqlite,
    Memory,
}

impl fmt::Display for IndexBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexBackendKind::Sqlite => write!(f, "sqlite"),
            IndexBackendKind::Memory => write!(f, "memory"),
        }
    }
}

// =============================================================================
// Owner Key
// =============================================================================

/// Owner secret, redacted in debug output
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct OwnerKey(String);

impl OwnerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "OwnerKey(<empty>)")
        } else {
            write!(f, "OwnerKey(***)")
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_size: Option<usize>,
    pub favicon: Option<String>,
}

/// Storage configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StorageFileConfig {
    /// Blob directory
    pub path: Option<String>,
    pub index: Option<IndexBackendKind>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub storage: Option<StorageFileConfig>,
    pub owner_key: Option<OwnerKey>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown top-level fields
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
            if server.max_upload_size.is_some() {
                tracing::trace!(size = ?server.max_upload_size, "Merging server.max_upload_size");
                current.max_upload_size = server.max_upload_size;
            }
            if server.favicon.is_some() {
                tracing::trace!(favicon = ?server.favicon, "Merging server.favicon");
                current.favicon = server.favicon;
            }
        }

        if let Some(storage) = other.storage {
            let current = self.storage.get_or_insert_with(StorageFileConfig::default);
            if storage.path.is_some() {
                tracing::trace!(path = ?storage.path, "Merging storage.path");
                current.path = storage.path;
            }
            if storage.index.is_some() {
                tracing::trace!(index = ?storage.index, "Merging storage.index");
                current.index = storage.index;
            }
        }

        if other.owner_key.is_some() {
            tracing::trace!("Merging owner_key");
            self.owner_key = other.owner_key;
        }
    }
}

// =============================================================================
// Runtime Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit in bytes
    pub max_upload_size: usize,
    pub favicon: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Blob directory override; `None` uses `{data_dir}/files`
    pub path: Option<PathBuf>,
    pub index: IndexBackendKind,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub owner_key: OwnerKey,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.shortfile/shortfile.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            max_upload_size = config.server.max_upload_size,
            index = %config.storage.index,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_storage = file_config.storage.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
            max_upload_size: cli
                .max_upload_size
                .or(file_server.max_upload_size)
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
            favicon: cli
                .favicon
                .clone()
                .or_else(|| file_server.favicon.map(PathBuf::from))
                .map(|p| expand_path(&p.to_string_lossy()))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FAVICON)),
        };

        let storage = StorageConfig {
            path: cli
                .storage_path
                .clone()
                .or_else(|| file_storage.path.map(PathBuf::from))
                .map(|p| expand_path(&p.to_string_lossy())),
            index: cli.index_backend.or(file_storage.index).unwrap_or_default(),
        };

        let owner_key = cli
            .owner_key
            .clone()
            .or(file_config.owner_key)
            .unwrap_or_default();

        Self {
            server,
            storage,
            owner_key,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if self.server.max_upload_size == 0 {
            anyhow::bail!("Configuration error: server.max_upload_size must be greater than 0");
        }
        Ok(())
    }

    /// Serving requires an owner key; maintenance commands do not
    pub fn require_owner_key(&self) -> Result<()> {
        if self.owner_key.is_empty() {
            anyhow::bail!(
                "Configuration error: owner_key must be set (--owner-key or SHORTFILE_OWNER_KEY)"
            );
        }
        Ok(())
    }
}

/// Get the profile config path (~/.shortfile/shortfile.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
