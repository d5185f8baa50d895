//! Stockwatch CLI
//!
//! Local execution entry point. For AWS Lambda, use `stockwatch-lambda`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use stockwatch::{
    error::Result,
    models::{CatalogCounts, Config},
    pipeline::{PassMode, PassRequest, ReconcileOutcome, Reconciler, Scheduler},
    services::{DiscordNotifier, SearchClient},
    storage::{LocalStorage, StateStore},
};

/// Stockwatch - Catalog Availability Monitor
#[derive(Parser, Debug)]
#[command(
    name = "stockwatch",
    version,
    about = "Watches a catalog search and announces items that come into stock"
)]
struct Cli {
    /// Path to storage directory containing config and catalog state
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Path to config file (default: {storage_dir}/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Search query to monitor (overrides monitor.query)
    #[arg(short = 'q', long)]
    search_query: Option<String>,

    /// Only track items whose name contains this text (overrides monitor.filter)
    #[arg(short, long)]
    filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a pass every interval until interrupted
    Run,

    /// Run one pass that records availability without announcing anything
    Seed,

    /// Run one pass with announcements
    Once,

    /// Validate configuration
    Validate,

    /// Show catalog state info
    Info,
}

/// Initialize logging from the verbosity flag or the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let mut config = Config::load_or_default(&config_path, explicit)?;
    init_logging(cli.verbose, &config.logging.level);

    if config_path.exists() {
        log::info!("Loaded configuration from {}", config_path.display());
    } else {
        log::warn!(
            "No config at {}, using defaults",
            config_path.display()
        );
    }

    if let Some(query) = cli.search_query {
        config.monitor.query = Some(query);
    }
    if let Some(filter) = cli.filter {
        config.monitor.filter = Some(filter);
    }

    let storage = Arc::new(LocalStorage::with_state_file(
        &cli.storage_dir,
        config.storage.state_file.clone(),
    ));

    match cli.command {
        Command::Run => {
            let scheduler = build_scheduler(&config, storage, PassMode::Notify)?;
            let stats = scheduler
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await;

            log::info!(
                "Stopped after {} passes ({} applied, {} no-op, {} failed, {} skipped)",
                stats.passes(),
                stats.applied,
                stats.noops,
                stats.failures,
                stats.skipped
            );
        }

        Command::Seed => {
            log::info!("Seed mode: announcements are suppressed");
            run_once(&config, storage, PassMode::Seed).await?;
        }

        Command::Once => {
            run_once(&config, storage, PassMode::Notify).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            let query = config.monitor.search_query()?;
            log::info!("✓ Config OK (query \"{}\")", query);
            if let Some(filter) = config.monitor.name_filter() {
                log::info!("✓ Name filter \"{}\"", filter);
            }
            match config.notifier.channel_id.as_deref() {
                Some(channel) => log::info!("✓ Announcing to channel {}", channel),
                None => log::warn!("notifier.channel_id is not set; only seeding will work"),
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Catalog: {}", storage.location());

            if storage.state_path().exists() {
                let state = storage.read_all().await?;
                let counts = CatalogCounts::of(&state);
                log::info!(
                    "Known items: {} ({} in stock, {} out of stock)",
                    counts.total,
                    counts.in_stock,
                    counts.out_of_stock
                );
            } else {
                log::info!("No catalog found yet. Run 'seed' first.");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}

/// Wire the engine and scheduler from configuration.
///
/// Configuration errors surface here, before any pass runs.
fn build_scheduler(
    config: &Config,
    storage: Arc<LocalStorage>,
    mode: PassMode,
) -> Result<Scheduler> {
    config.validate()?;
    let request = PassRequest::new(
        config.monitor.search_query()?,
        config.monitor.name_filter(),
        mode,
    );

    let fetcher = Arc::new(SearchClient::new(&config.fetcher)?);
    let mut reconciler = Reconciler::new(fetcher, storage);
    if mode == PassMode::Notify {
        reconciler = reconciler.with_notifier(Arc::new(DiscordNotifier::from_env(
            &config.notifier,
        )?));
    }

    Ok(Scheduler::new(
        Arc::new(reconciler),
        request,
        Duration::from_secs(config.monitor.interval_secs),
    ))
}

/// Run exactly one pass; a failed pass becomes the process exit status.
async fn run_once(config: &Config, storage: Arc<LocalStorage>, mode: PassMode) -> Result<()> {
    let scheduler = build_scheduler(config, storage, mode)?;

    match scheduler.tick().await {
        Some(Ok(ReconcileOutcome::Applied(report))) => {
            log::info!(
                "{} newly available: {}",
                report.notify_set.len(),
                report.notify_set.join(", ")
            );
            Ok(())
        }
        Some(Ok(_)) | None => Ok(()),
        Some(Err(e)) => Err(e),
    }
}
