use clap::Parser;
use tracing_subscriber::EnvFilter;

use member_api::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = member_api::config::config();

    let default_filter = if config.api.enable_request_logging {
        "info,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    tracing::info!("Starting Member API in {:?} mode", config.environment);

    let cli = Cli::parse();
    member_api::cli::run(cli, config).await
}
