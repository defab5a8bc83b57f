use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::Config;
use crate::db::Database;

pub mod commands;
pub mod migrate;

#[derive(Parser)]
#[command(
    name = "donorcast",
    about = "Predict a donor's next contribution amount and date",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (train and predict endpoints)
    Serve {
        /// Override SERVER_HOST
        #[arg(long)]
        host: Option<String>,

        /// Override SERVER_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Train both regressors from a CSV file and save them
    Train {
        /// Training CSV path
        #[arg(short, long, default_value = "donation_data.csv")]
        csv: PathBuf,
    },

    /// Predict for a donor described by a JSON file
    Predict {
        /// Path to a JSON document shaped like the /predict/ request body
        #[arg(short, long)]
        json: PathBuf,
    },

    /// Write a synthetic training dataset
    Generate {
        /// Number of rows to generate
        #[arg(short, long, default_value_t = 400)]
        rows: usize,

        /// Output CSV path
        #[arg(short, long, default_value = "donation_data.csv")]
        out: PathBuf,

        /// Seed for a reproducible dataset
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run database migrations
    Migrate,
}

/// Execute CLI command with the optional database
pub async fn run(cli: Cli, config: Config, db: Option<Database>) -> Result<()> {
    match cli.command {
        Commands::Serve { host, port } => {
            info!("Starting API server");
            commands::serve(config, db, host, port).await?;
        }
        Commands::Train { csv } => {
            info!("Training models from {}", csv.display());
            commands::train(&config, &csv).await?;
        }
        Commands::Predict { json } => {
            info!("Predicting from {}", json.display());
            commands::predict(&config, &json).await?;
        }
        Commands::Generate { rows, out, seed } => {
            info!("Generating {} synthetic rows", rows);
            commands::generate(rows, &out, seed)?;
        }
        Commands::Migrate => {
            migrate::execute(db).await?;
        }
    }
    Ok(())
}
