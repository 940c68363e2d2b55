use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

use crate::app::{app, AppState};
use crate::config::{self, AppConfig, StorageBackend};
use crate::database;

#[derive(Parser)]
#[command(name = "cropwatch-api")]
#[command(about = "CropWatch API - crops, fields, drones and plant health tracking")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve(ServeArgs),

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

#[derive(Args, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides CROPWATCH_PORT/PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Address to bind (overrides HOST)")]
    pub host: Option<String>,

    #[arg(long, help = "Storage backend: memory or postgres (overrides CROPWATCH_STORAGE)")]
    pub storage: Option<StorageBackend>,
}

impl ServeArgs {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(backend) = self.storage {
            config.storage.backend = backend;
        }
        config
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::config().clone();

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => serve(args.apply(config)).await,
        Commands::Migrate => {
            database::manager::run_migrations(&config)
                .await
                .context("failed to apply migrations")?;
            println!("Migrations applied");
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting CropWatch API in {:?} mode with {:?} storage",
        config.environment,
        config.storage.backend
    );

    let storage = database::build_storage(&config)
        .await
        .context("failed to initialise storage")?;
    let bind_addr = config.bind_addr();
    let state = AppState::new(storage, config)?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("CropWatch API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
