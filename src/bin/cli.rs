//! shelterwatch CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use shelterwatch::{
    error::Result,
    models::Config,
    pipeline::PollLoop,
    services::{HttpFeed, notifier},
    storage::{RecordStore, SqliteStore},
    utils::shutdown::{self, Shutdown},
};

/// shelterwatch - Adoptable Animal Feed Watcher
#[derive(Parser, Debug)]
#[command(
    name = "shelterwatch",
    version,
    about = "Announces animals arriving at and leaving a shelter's adoption feed"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the feed until interrupted
    Run,

    /// Run a single reconciliation cycle
    Once,

    /// Show tracked animals
    List {
        /// Only show animals that are still available
        #[arg(long)]
        available: bool,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, default_level: &str) {
    let level = if verbose { "debug" } else { default_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the config file, then apply environment overrides.
///
/// Only a missing file falls back to defaults.
fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load_if_present(path)?;
    config.apply_env()?;
    Ok(config)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet, so peek at the configured level first.
    let level = Config::load(&cli.config)
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    init_logging(cli.verbose, &level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    log::info!("shelterwatch starting...");

    let config = load_config(&cli.config)?;
    log::info!("Loaded configuration from {}", cli.config.display());

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("✓ Config OK");
        return Ok(());
    }

    config.validate()?;

    // Without a store there is nothing useful to do.
    let store = SqliteStore::open(&config.storage.database_path)?;

    match cli.command {
        Command::Run => {
            let feed = HttpFeed::new(&config.feed)?;
            let notifier = notifier::from_config(&config)?;

            let (trigger, handle) = Shutdown::channel();
            shutdown::listen_for_signals(trigger);

            PollLoop::from_config(&config, &feed, &store, notifier.as_ref())
                .run(handle)
                .await;
        }

        Command::Once => {
            let feed = HttpFeed::new(&config.feed)?;
            let notifier = notifier::from_config(&config)?;

            let report = PollLoop::from_config(&config, &feed, &store, notifier.as_ref())
                .run_once()
                .await?;

            if report.notify_failures > 0 {
                log::warn!("{} notifications failed", report.notify_failures);
            }
        }

        Command::List { available } => {
            let records = store.records()?;
            let shown: Vec<_> = records
                .iter()
                .filter(|r| !available || r.available)
                .collect();

            for record in &shown {
                println!(
                    "{:<12} {:<24} {:<20} {}",
                    record.id,
                    record.name,
                    record.age,
                    if record.available { "available" } else { "gone" }
                );
            }
            log::info!("{} of {} tracked animals shown", shown.len(), records.len());
        }

        Command::Validate => {}
    }

    log::info!("Done!");

    Ok(())
}
