//! Core application

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands, SystemCommands};
use crate::core::config::{AppConfig, IndexBackendKind};
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG, ENV_LOG_FORMAT};
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::{FileRepository, IndexService, open_repository};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub storage: AppStorage,
    pub index: IndexService,
    pub repository: FileRepository,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        let (cli_config, command) = cli::parse();
        Self::init_logging(cli_config.debug);

        tracing::debug!("Application starting");
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::System {
                command: system_cmd,
            }) => Self::handle_system_command(system_cmd, &cli_config).await,
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        config.require_owner_key()?;

        let (storage, index, repository) = Self::open_stores(&config).await?;
        let shutdown = ShutdownService::new(repository.clone());

        Ok(Self {
            shutdown,
            config,
            storage,
            index,
            repository,
        })
    }

    async fn open_stores(config: &AppConfig) -> Result<(AppStorage, IndexService, FileRepository)> {
        let storage = AppStorage::init(config).await?;
        let index = IndexService::init(config.storage.index, &storage)
            .await
            .context("Failed to open metadata index")?;
        let repository = open_repository(&storage, &index)
            .await
            .context("Failed to open file repository")?;

        tracing::debug!(repository = ?repository, "Stores opened");
        Ok((storage, index, repository))
    }

    async fn handle_system_command(cmd: SystemCommands, cli: &CliConfig) -> Result<()> {
        match cmd {
            SystemCommands::Prune { yes } => Self::prune_data(yes),
            SystemCommands::Sweep { dry_run } => Self::sweep(cli, dry_run).await,
        }
    }

    fn prune_data(skip_confirm: bool) -> Result<()> {
        let data_dir = AppStorage::resolve_data_dir();

        if !data_dir.exists() {
            println!(
                "Nothing to prune. Data directory does not exist: {}",
                data_dir.display()
            );
            return Ok(());
        }

        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);

        println!("This will permanently delete the index and all stored files in:");
        println!("  {}", data_dir.display());
        println!();
        println!("Stop the server first. A custom --storage-path is not touched.");

        if !skip_confirm {
            print!("\nContinue? [y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
                println!("Aborted.");
                return Ok(());
            }
        }

        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("Failed to delete data directory: {}", data_dir.display()))?;
        println!("Pruned: {}", data_dir.display());
        Ok(())
    }

    /// Reconcile the index with the blob directory
    async fn sweep(cli: &CliConfig, dry_run: bool) -> Result<()> {
        let config = AppConfig::load(cli)?;
        ensure_sweepable(config.storage.index)?;
        let (_storage, _index, repository) = Self::open_stores(&config).await?;

        let result = repository.sweep(dry_run).await;
        // Close before reporting so the SQLite WAL is checkpointed either way
        let closed = repository.close().await;
        let report = result.context("Sweep failed")?;
        closed.context("Failed to close repository")?;

        if report.is_clean() {
            println!("Index and blob store are consistent.");
            return Ok(());
        }

        let verb = if dry_run { "Would remove" } else { "Removed" };
        println!(
            "{verb} {} orphan blob(s) and {} dangling index entr(ies):",
            report.orphan_blobs.len(),
            report.dangling_ids.len()
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    fn init_logging(debug: bool) {
        let default_filter = if debug {
            "debug".to_string()
        } else {
            format!("info,{}=info", APP_NAME_LOWER)
        };

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
        let builder = tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_env_filter(filter);

        if json {
            builder.json().init();
        } else {
            builder.with_ansi(true).compact().init();
        }
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        if let Some(handle) = app.index.start_background_tasks(app.shutdown.subscribe()) {
            app.shutdown.register(handle).await;
        }

        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            &app.storage.data_dir().display().to_string(),
            &app.storage.files_dir().display().to_string(),
            &app.config.storage.index.to_string(),
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}

/// The memory index starts empty, so every blob would look orphaned
fn ensure_sweepable(index: IndexBackendKind) -> Result<()> {
    if index == IndexBackendKind::Memory {
        anyhow::bail!(
            "system sweep needs a persistent index; with the memory index every stored blob \
             would be deleted as an orphan"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_refuses_memory_index() {
        let err = ensure_sweepable(IndexBackendKind::Memory).unwrap_err();
        assert!(err.to_string().contains("persistent index"));
        assert!(ensure_sweepable(IndexBackendKind::Sqlite).is_ok());
    }
}
