//! backup-sync - Main Entry Point
//!
//! Synchronizes an accsyn backup job with the local project folders.

use backup_sync::api::{AccsynClient, AccsynConfig, ApiSession};
use backup_sync::config::BackupConfig;
use backup_sync::error::{sanitize_error_message, BackupError};
use backup_sync::observability::init_default_logging;
use backup_sync::sync::BackupSync;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info};

/// accsyn backup job synchronizer
#[derive(Parser)]
#[command(name = "backup-sync")]
#[command(about = "Keep an accsyn backup job in sync with local project folders")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "BACKUP_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the backup job with the project folders
    Run {
        /// Plan and log, but do not submit any change
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the planned changes as JSON without submitting them
    Plan,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Check API credentials and connectivity
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    info!("Starting backup-sync v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run { dry_run } => run_sync(config, dry_run).await,
        Commands::Plan => print_plan(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
        Commands::Check => check_session(&config).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e.sanitized());
        process::exit(1);
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> Result<BackupConfig, BackupError> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(BackupConfig::load_from_file(path)?);
    }

    // Try default locations
    for path_str in ["backup.toml", "config/backup.toml"] {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(BackupConfig::load_from_file(&path)?);
        }
    }

    Err(BackupError::internal_error(
        "No configuration file found. Please provide one with -c/--config or create backup.toml",
    ))
}

/// Session factory: credentials come from the environment at this point only
fn create_session(config: &BackupConfig) -> Result<AccsynClient, BackupError> {
    let client_config = AccsynConfig {
        base_url: config.resolve_base_url()?,
        user: config.get_api_user()?,
        api_key: config.get_api_key()?,
        timeout: Duration::from_secs(config.api.timeout_secs),
    };
    Ok(AccsynClient::new(client_config)?)
}

async fn run_sync(config: BackupConfig, dry_run: bool) -> Result<(), BackupError> {
    let session = create_session(&config)?;
    let sync = BackupSync::new(config, session).with_dry_run(dry_run);
    let report = sync.run().await?;

    if !report.changed_anything() {
        info!("Nothing changed");
    }
    Ok(())
}

async fn print_plan(config: BackupConfig) -> Result<(), BackupError> {
    let session = create_session(&config)?;
    let sync = BackupSync::new(config, session).with_dry_run(true);
    let (_, plan) = sync.plan().await?;

    let rendered = serde_json::to_string_pretty(&plan)
        .map_err(|e| BackupError::internal_error(format!("Failed to render plan: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn handle_config_command(config: &BackupConfig, show: bool) -> Result<(), BackupError> {
    if show {
        let rendered = toml::to_string_pretty(config).map_err(|e| {
            BackupError::internal_error(format!("Failed to render configuration: {e}"))
        })?;
        println!("Current configuration:");
        println!("{rendered}");
    }

    info!("Configuration validation complete");
    Ok(())
}

async fn check_session(config: &BackupConfig) -> Result<(), BackupError> {
    let session = create_session(config)?;
    session.health_check().await?;
    info!(
        "accsyn API reachable and credentials accepted ({})",
        sanitize_error_message(&config.resolve_base_url()?)
    );
    Ok(())
}
