//! `aidiyd`: the AIDIY server binary.
//!
//! Usage:
//!   aidiyd serve -c <context-name-or-path> [--listen <addr>]
//!   aidiyd init -c <path> --data-dir <dir>
//!
//! The context name resolves to `/etc/aidiy/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use tracing::info;

use aidiy_auth::mailer::LogMailer;
use aidiy_auth::service::TokenInfoVerifier;
use aidiy_auth::{sweeper, AuthModule};
use aidiy_core::Module;

use config::ServerConfig;

/// AIDIY server.
#[derive(Parser, Debug)]
#[command(name = "aidiyd", about = "AIDIY parental-control server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Context name or path to config file.
        #[arg(short = 'c', long = "config", required = true)]
        config: String,

        /// Listen address (overrides `server.listen`).
        #[arg(long = "listen")]
        listen: Option<String>,
    },

    /// Write a new config file with a random JWT secret.
    Init {
        /// Context name or path of the config file to create.
        #[arg(short = 'c', long = "config", required = true)]
        config: String,

        /// Data directory for the redb store.
        #[arg(long = "data-dir", default_value = "/var/lib/aidiy")]
        data_dir: String,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { config, listen } => serve(&config, listen).await,
        Commands::Init {
            config,
            data_dir,
            force,
        } => init(&config, &data_dir, force),
    }
}

async fn serve(config_arg: &str, listen: Option<String>) -> anyhow::Result<()> {
    let config_path = ServerConfig::resolve_path(config_arg);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    bootstrap::verify_config(&server_config)?;
    let kv = bootstrap::open_store(&server_config)?;

    let cors_origin = HeaderValue::from_str(&server_config.server.cors_origin)
        .map_err(|e| anyhow::anyhow!("invalid server.cors_origin: {}", e))?;

    let auth_module = AuthModule::new(
        kv,
        Arc::new(LogMailer::new(server_config.mail.sender.clone())),
        Arc::new(TokenInfoVerifier::new(server_config.google.client_id.clone())),
        server_config.to_auth_config(),
    );
    info!("Auth module initialized");

    let sweeper = sweeper::start(
        Arc::clone(auth_module.service()),
        Duration::from_secs(server_config.otp.sweep_interval_secs.max(1)),
    );

    let module_routes = vec![(auth_module.name(), auth_module.routes())];
    let app = routes::build_router(module_routes, cors_origin);

    let addr = listen.unwrap_or_else(|| server_config.server.listen.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("AIDIY server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.cancel();
    info!("AIDIY server stopped");
    Ok(())
}

fn init(config_arg: &str, data_dir: &str, force: bool) -> anyhow::Result<()> {
    let path = ServerConfig::resolve_path(config_arg);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it.",
            path.display()
        );
    }

    let config = ServerConfig::generate(data_dir);
    config.save(&path)?;

    println!("Config written to {}", path.display());
    println!("  Data:   {}", data_dir);
    println!("  Listen: {}", config.server.listen);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
