//! SQLite schema for the metadata index

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initial schema SQL
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER
);

-- One row per short identifier; value is a MessagePack-encoded record
CREATE TABLE IF NOT EXISTS file_index (
    key TEXT PRIMARY KEY NOT NULL CHECK(length(key) >= 1),
    value BLOB NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
