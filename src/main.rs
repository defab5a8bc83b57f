use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donorcast::cli::{self, Cli};
use donorcast::config::Config;
use donorcast::db::Database;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = Config::load()?;

    // Initialize tracing with structured JSON logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "donorcast starting up");

    // Donor persistence is optional; without DATABASE_URL only the models are stored
    let db = match &config.database {
        Some(db_config) => {
            let db = Database::new(db_config).await?;
            db.run_migrations().await?;
            db.health_check().await?;
            info!("Database initialized successfully");
            Some(db)
        }
        None => {
            info!("DATABASE_URL not set; donor profiles will not be persisted");
            None
        }
    };

    cli::run(cli, config, db).await?;

    info!("donorcast completed successfully");
    Ok(())
}
