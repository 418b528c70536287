// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "Shortfile";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "shortfile";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".shortfile";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "shortfile.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SHORTFILE_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_DEBUG: &str = "SHORTFILE_DEBUG";
pub const ENV_HOST: &str = "SHORTFILE_HOST";
pub const ENV_PORT: &str = "SHORTFILE_PORT";

/// Environment variable for log level/filter (falls back to `RUST_LOG`)
pub const ENV_LOG: &str = "SHORTFILE_LOG";

/// `json` switches log output to one JSON object per line
pub const ENV_LOG_FORMAT: &str = "SHORTFILE_LOG_FORMAT";

/// Secret compared against the `authorization` header on owner-only routes
pub const ENV_OWNER_KEY: &str = "SHORTFILE_OWNER_KEY";

/// Override for the blob directory (defaults to `{data_dir}/files`)
pub const ENV_STORAGE_PATH: &str = "SHORTFILE_STORAGE_PATH";

pub const ENV_MAX_UPLOAD_SIZE: &str = "SHORTFILE_MAX_UPLOAD_SIZE";

/// Icon served at `/favicon.ico`
pub const ENV_FAVICON: &str = "SHORTFILE_FAVICON";

/// Metadata index backend: `sqlite` or `memory`
pub const ENV_INDEX_BACKEND: &str = "SHORTFILE_INDEX_BACKEND";

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "SHORTFILE_DATA_DIR";

// =============================================================================
// Server Defaults
// =============================================================================

pub const DEFAULT_HOST: &str = "127.0.0.1";

pub const DEFAULT_PORT: u16 = 5390;

/// Default upload limit (32 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 32 * 1024 * 1024;

/// Relative paths resolve against the working directory
pub const DEFAULT_FAVICON: &str = "favicon.ico";

/// Graceful shutdown timeout for background tasks
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Request id header propagated through the trace span
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Identifiers
// =============================================================================

/// Longest caller-chosen identifier
pub const MAX_SHORT_ID_LEN: usize = 64;

/// Identifiers that would shadow fixed routes or well-known paths
pub const RESERVED_IDS: &[&str] = &["favicon.ico", "robots.txt", "version", "index", "health"];

/// Bytes inspected for content type detection
pub const SNIFF_LEN: usize = 512;

/// Multipart form field holding the upload
pub const UPLOAD_FIELD: &str = "file";

// =============================================================================
// SQLite Index
// =============================================================================

pub const INDEX_DB_FILENAME: &str = "index.db";

pub const SQLITE_MAX_CONNECTIONS: u32 = 8;

pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;

/// Interval between WAL checkpoints
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;
