use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Donor persistence is disabled when DATABASE_URL is not set
    pub database: Option<DatabaseConfig>,
    pub server: ServerConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub iterations: usize,
    pub max_depth: u32,
    pub shrinkage: f32,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file - this sets env vars that aren't already set
        dotenv::dotenv().ok();

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,
                min_connections: parse_var("DB_MIN_CONNECTIONS", "1")?,
            }),
            _ => None,
        };

        let config = Config {
            database,
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", "8000")?,
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", "10485760")?,
            },
            model: ModelConfig {
                path: PathBuf::from(
                    env::var("MODEL_PATH").unwrap_or_else(|_| "ml_model.json".to_string()),
                ),
                iterations: parse_var("MODEL_ITERATIONS", "100")?,
                max_depth: parse_var("MODEL_MAX_DEPTH", "6")?,
                shrinkage: parse_var("MODEL_SHRINKAGE", "0.1")?,
            },
        };

        Ok(config)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Invalid {} value", key))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            server: ServerConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ml_model.json"),
            iterations: 100,
            max_depth: 6,
            shrinkage: 0.1,
        }
    }
}
