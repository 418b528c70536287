use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::{IndexBackendKind, OwnerKey};
use super::constants::{
    ENV_CONFIG, ENV_DEBUG, ENV_FAVICON, ENV_HOST, ENV_INDEX_BACKEND, ENV_MAX_UPLOAD_SIZE,
    ENV_OWNER_KEY, ENV_PORT, ENV_STORAGE_PATH,
};

#[derive(Parser)]
#[command(name = "shortfile")]
#[command(version, about = "Short-link file host", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Secret required in the `authorization` header for custom ids and deletes
    #[arg(long, global = true, env = ENV_OWNER_KEY, hide_env_values = true)]
    pub owner_key: Option<String>,

    /// Directory for stored files (default: <data dir>/files)
    #[arg(long, global = true, env = ENV_STORAGE_PATH)]
    pub storage_path: Option<PathBuf>,

    /// Maximum upload size in bytes
    #[arg(long, global = true, env = ENV_MAX_UPLOAD_SIZE)]
    pub max_upload_size: Option<usize>,

    /// Icon file served at /favicon.ico (default: ./favicon.ico)
    #[arg(long, global = true, env = ENV_FAVICON)]
    pub favicon: Option<PathBuf>,

    /// Metadata index backend (sqlite or memory)
    #[arg(long, global = true, env = ENV_INDEX_BACKEND, value_parser = parse_index_backend)]
    pub index_backend: Option<IndexBackendKind>,

    /// Enable debug logging
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

/// Parse index backend from CLI/env string
fn parse_index_backend(s: &str) -> Result<IndexBackendKind, String> {
    match s.to_lowercase().as_str() {
        "sqlite" => Ok(IndexBackendKind::Sqlite),
        "memory" => Ok(IndexBackendKind::Memory),
        _ => Err(format!(
            "Invalid index backend '{}'. Valid options: sqlite, memory",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete local data directory (index and stored files). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Find blobs without index entries and entries without blobs, and remove them
    Sweep {
        /// Only report what would be removed
        #[arg(long)]
        dry_run: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub owner_key: Option<OwnerKey>,
    pub storage_path: Option<PathBuf>,
    pub max_upload_size: Option<usize>,
    pub favicon: Option<PathBuf>,
    pub index_backend: Option<IndexBackendKind>,
    pub debug: bool,
    pub config: Option<PathBuf>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            owner_key: cli.owner_key.map(OwnerKey::new),
            storage_path: cli.storage_path,
            max_upload_size: cli.max_upload_size,
            favicon: cli.favicon,
            index_backend: cli.index_backend,
            debug: cli.debug,
            config: cli.config,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    (cli.into(), command)
}
