pub mod history;
pub mod migrate;
pub mod model;
pub mod provider;
pub mod settings;
pub mod stats;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use gw_domain::config::Config;
use gw_store::Store;
use model::ModelCommand;
use provider::ProviderCommand;
use settings::SettingsCommand;

/// An OpenAI-compatible gateway fronting multiple LLM backends.
#[derive(Debug, Parser)]
#[command(name = "gatewayd", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Provider CRUD and lifecycle.
    #[command(subcommand)]
    Provider(ProviderCommand),
    /// Model registration and provider links.
    #[command(subcommand)]
    Model(ModelCommand),
    /// Read or write a setting.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Run (or preview) pending schema migrations.
    Migrate {
        #[arg(long)]
        dry_run: bool,
    },
    /// List recent requests and their outcome.
    History {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Aggregate counters over the store.
    Stats,
    /// Shorthand for `settings set active_provider <id>`, after checking it exists.
    Set { provider: String },
    /// Print the resolved config and a summary of registered providers.
    Status,
    /// Print version information.
    Version,
}

/// The single place CLI errors are caught: every subcommand returns
/// `anyhow::Result<()>`, and any `Err` here becomes a one-line stderr
/// message plus a non-zero exit, mirroring `Error`'s `IntoResponse` at the
/// HTTP boundary.
pub async fn dispatch(command: Command, config: Arc<Config>) -> anyhow::Result<()> {
    match run(command, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// Opens the store for a CLI command without `Store::open`'s session-clear
/// side effect, so `gatewayd stats` run against a live server's database
/// doesn't blow away its in-flight sessions. Assumes migrations already ran
/// (via `serve` or `gatewayd migrate`); fails clearly if the schema is
/// missing rather than silently degrading.
async fn open_store(config: &Config) -> anyhow::Result<Store> {
    let pool = gw_store::connect_raw(&config.db_path).await?;
    Ok(Store::from_pool(pool))
}

async fn run(command: Command, config: Arc<Config>) -> anyhow::Result<()> {
    match command {
        Command::Serve | Command::Version => {
            unreachable!("handled directly in main before dispatch")
        }
        Command::Migrate { dry_run } => migrate::run(&config, dry_run).await,
        Command::Provider(cmd) => {
            let store = open_store(&config).await?;
            provider::run(&store, cmd).await
        }
        Command::Model(cmd) => {
            let store = open_store(&config).await?;
            model::run(&store, cmd).await
        }
        Command::Settings(cmd) => {
            let store = open_store(&config).await?;
            settings::run(&store, cmd).await
        }
        Command::History { provider, limit } => {
            let store = open_store(&config).await?;
            history::run(&store, provider, limit).await
        }
        Command::Stats => {
            let store = open_store(&config).await?;
            stats::run(&store).await
        }
        Command::Set { provider } => {
            let store = open_store(&config).await?;
            provider::set_active(&store, &provider).await
        }
        Command::Status => {
            let store = open_store(&config).await?;
            stats::status(&store, &config).await
        }
    }
}
