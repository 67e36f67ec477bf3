use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gw_domain::config::Config;
use gw_gateway::bootstrap::{build_app_state, spawn_background_tasks};
use gw_gateway::cli::{Cli, Command};
use gw_gateway::{api, cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            init_tracing();
            run_server(Arc::new(Config::from_env())).await
        }
        Some(Command::Version) => {
            println!("gatewayd {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(other) => {
            init_tracing();
            cli::dispatch(other, Arc::new(Config::from_env())).await
        }
    }
}

/// JSON-formatted structured logging; `LOG_LEVEL`/`RUST_LOG` drive the filter.
/// OTLP export is carried as an optional dependency for deployments that
/// layer it in externally; the core only needs `tracing` + `tracing-subscriber`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gw_gateway=debug")),
        )
        .json()
        .init();
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("gateway starting");

    let state = build_app_state(config.clone())
        .await
        .context("building application state")?;
    spawn_background_tasks(&state);

    let app = api::router(state.clone()).with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "gateway listening");

    axum::serve(listener, app).await.context("axum server error")?;
    Ok(())
}
