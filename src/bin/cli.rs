//! jobwatch CLI
//!
//! Runs the vacancy check once or on a schedule, and manages subscriptions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jobwatch::{
    error::{AppError, Result},
    models::{Config, NewSubscription},
    pipeline,
    services::resolve_area,
    storage::SqliteStore,
};
use tokio::time::MissedTickBehavior;

/// jobwatch - hh.ru vacancy notifications for Telegram
#[derive(Parser, Debug)]
#[command(
    name = "jobwatch",
    version,
    about = "Polls hh.ru for new vacancies and notifies Telegram subscribers"
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
    /// Run a single vacancy check
    Run {
        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run vacancy checks every `cycle.interval_secs` until Ctrl-C
    Watch,

    /// Register a chat and add a subscription for it
    Subscribe {
        /// Telegram chat id to notify
        #[arg(long)]
        chat_id: String,

        /// Search keywords, comma separated
        #[arg(long)]
        keywords: String,

        /// City name or hh.ru area id
        #[arg(long)]
        city: Option<String>,

        /// hh.ru experience code (noExperience, between1And3, between3And6, moreThan6)
        #[arg(long)]
        experience: Option<String>,

        /// Minimum salary
        #[arg(long)]
        salary: Option<i64>,
    },

    /// Validate configuration
    Validate,

    /// Show storage statistics
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (mut config, load_error) = match Config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_env();
    init_logging(cli.verbose, &config.logging.level);

    if let Some(e) = load_error {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
    }

    if let Err(e) = execute(cli, config).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn execute(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Run { json } => {
            config.validate()?;
            let cycle = pipeline::build_cycle(&config).await?;
            let report = pipeline::run_cycle(&cycle).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }

        Command::Watch => {
            config.validate()?;
            let cycle = pipeline::build_cycle(&config).await?;

            let mut ticker = tokio::time::interval(config.cycle.interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

            log::info!(
                "Checking vacancies every {}s, press Ctrl-C to stop",
                config.cycle.interval_secs
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = pipeline::run_cycle(&cycle).await {
                            log::error!("Vacancy check failed: {}", e);
                        }
                    }
                    _ = &mut shutdown => {
                        log::info!("Shutting down");
                        break;
                    }
                }
            }
        }

        Command::Subscribe {
            chat_id,
            keywords,
            city,
            experience,
            salary,
        } => {
            if keywords.trim().is_empty() {
                return Err(AppError::validation("keywords must not be empty"));
            }
            if salary.is_some_and(|s| s < 0) {
                return Err(AppError::validation("salary must not be negative"));
            }
            if let Some(city) = city.as_deref() {
                if resolve_area(city).is_none() {
                    log::warn!("Unknown city {:?}, the search will cover all regions", city);
                }
            }

            let store = SqliteStore::connect(&config.database).await?;
            let recipient = store.register_recipient(&chat_id).await?;
            let subscription = store
                .add_subscription(
                    recipient.id,
                    &NewSubscription {
                        keywords,
                        location_filter: city,
                        experience_filter: experience,
                        min_salary: salary,
                    },
                )
                .await?;

            log::info!(
                "Subscription {} added for chat {} (recipient {})",
                subscription.id,
                recipient.delivery_address,
                recipient.id
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if config.telegram.bot_token.trim().is_empty() {
                log::warn!("No bot token configured, set TELEGRAM_BOT_TOKEN before running");
            }

            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            log::info!("Database: {}", config.database.url);

            let store = SqliteStore::connect(&config.database).await?;
            let counts = store.counts().await?;
            log::info!(
                "Recipients: {} ({} active)",
                counts.recipients,
                counts.active_recipients
            );
            log::info!(
                "Subscriptions: {} ({} active)",
                counts.subscriptions,
                counts.active_subscriptions
            );
            log::info!("Stored listings: {}", counts.listings);
        }
    }

    Ok(())
}
