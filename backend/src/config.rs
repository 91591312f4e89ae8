//! Configuration management for the WashTrack server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with WASHTRACK_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Spreadsheet export configuration
    pub sheets: SheetsConfig,

    /// Activity-log retention configuration
    pub retention: RetentionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetsConfig {
    /// Whether spreadsheet export is enabled; when false every export call
    /// is a no-op
    pub enabled: bool,

    /// Spreadsheet values API endpoint
    pub base_url: String,

    /// Target spreadsheet id
    pub spreadsheet_id: String,

    /// Bearer token for the spreadsheet API
    pub api_token: String,

    /// Per-request timeout so a slow export can never stall a caller
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetentionConfig {
    /// Activity-log rows older than this many hours are swept
    pub activity_log_hours: i64,

    /// How often the sweeper runs
    pub sweep_interval_minutes: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("WASHTRACK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("sheets.enabled", false)?
            .set_default("sheets.base_url", "https://sheets.googleapis.com/v4/spreadsheets")?
            .set_default("sheets.spreadsheet_id", "")?
            .set_default("sheets.api_token", "")?
            .set_default("sheets.timeout_secs", 10)?
            .set_default("retention.activity_log_hours", 12)?
            .set_default("retention.sweep_interval_minutes", 60)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WASHTRACK prefix)
            .add_source(
                Environment::with_prefix("WASHTRACK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
