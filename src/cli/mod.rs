use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use crate::app::{self, AppState};
use crate::auth::{Identity, SessionResolver};
use crate::config::{AppConfig, Environment};
use crate::database::manager::DatabaseManager;
use crate::database::postgres::PgUserDirectory;

#[derive(Parser)]
#[command(name = "member-api")]
#[command(about = "Member profile and role administration API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Create the users table in DATABASE_URL")]
    Migrate,

    #[command(about = "Print a session token for an identity (development only)")]
    Token {
        #[arg(long, help = "Identity provider user id")]
        identity: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
}

pub async fn run(cli: Cli, config: &AppConfig) -> Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => migrate(config).await,
        Commands::Token { identity, name, email } => {
            if config.environment != Environment::Development {
                bail!("token minting is only available with APP_ENV=development");
            }
            let identity = Identity {
                name,
                email,
                ..Identity::new(identity)
            };
            let token = SessionResolver::from_config(&config.security).issue(&identity)?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(config: &AppConfig) -> Result<()> {
    if config.security.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set when APP_ENV is {:?}", config.environment);
    }
    if config.environment == Environment::Development {
        tracing::warn!("Running in development mode; do not expose this instance");
    }

    let directory = DatabaseManager::open_directory(&config.database)
        .await
        .context("failed to open user directory")?;
    let state = AppState::new(directory, SessionResolver::from_config(&config.security));
    let router = app::app(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Member API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn migrate(config: &AppConfig) -> Result<()> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to DATABASE_URL")?;
    PgUserDirectory::new(pool).ensure_schema().await?;
    tracing::info!("users table is up to date");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
