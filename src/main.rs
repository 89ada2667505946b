//! # Herald — scheduled message delivery for Discord channels
//!
//! Persists scheduled notifications in SQLite and delivers each one at most
//! once when due. The scheduler starts only after the Discord session is
//! confirmed.
//!
//! Usage:
//!   herald                         # Run with ~/.herald/config.toml
//!   herald --interval 10           # Faster due-checks
//!   herald --db ./notifications.db # Custom database location

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use herald_channels::DiscordChannel;
use herald_core::HeraldConfig;
use herald_core::traits::ChatGateway;
use herald_scheduler::{Dispatcher, NotificationStore, Scheduler, SchedulerEngine};

#[derive(Parser)]
#[command(name = "herald", version, about = "Scheduled message delivery for chat channels")]
struct Cli {
    /// Config file path (default: ~/.herald/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Notification database path (overrides config)
    #[arg(long)]
    db: Option<String>,

    /// Seconds between due-checks (overrides config)
    #[arg(long)]
    interval: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "herald=debug,herald_scheduler=debug,herald_channels=debug"
    } else {
        "herald=info,herald_scheduler=info,herald_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Load configuration, then let CLI flags win
    let mut config = match &cli.config {
        Some(path) => {
            let mut c = HeraldConfig::load_from(&expand_path(path))
                .with_context(|| format!("loading config from {path}"))?;
            c.apply_env();
            c
        }
        None => HeraldConfig::load().context("loading config")?,
    };
    if let Some(db) = &cli.db {
        config.scheduler.db_path = expand_path(db);
    }
    if let Some(interval) = cli.interval {
        config.scheduler.poll_interval_secs = interval;
    }

    if config.discord.bot_token.is_empty() {
        bail!("No Discord bot token configured. Set discord.bot_token or the DISCORD_TOKEN env var.");
    }
    if !config.discord.enabled {
        bail!("Discord channel is disabled in config.");
    }

    // Open the durable store before touching the network
    let store = Arc::new(
        NotificationStore::open(&config.scheduler.db_path)
            .with_context(|| format!("opening store at {}", config.scheduler.db_path.display()))?,
    );
    let pending = store.pending_count().unwrap_or(0);

    println!("Herald v{}", env!("CARGO_PKG_VERSION"));
    println!("   Database:  {}", config.scheduler.db_path.display());
    println!("   Interval:  {}s", config.scheduler.poll_interval_secs);
    println!("   Pending:   {pending} notification(s)");
    println!();

    // The scheduler starts only after the session is confirmed
    let mut gateway = DiscordChannel::new(&config.discord);
    gateway
        .connect()
        .await
        .context("connecting to Discord")?;

    let gateway: Arc<dyn ChatGateway> = Arc::new(gateway);
    let engine = Arc::new(SchedulerEngine::new(
        Arc::clone(&store),
        Dispatcher::new(gateway),
    ));
    let scheduler = Scheduler::new(
        engine,
        Duration::from_secs(config.scheduler.poll_interval_secs),
    );
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}
