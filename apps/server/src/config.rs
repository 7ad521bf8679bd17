//! Configuration loading for the catalog binaries
//!
//! Layering: built-in defaults, then an optional `config/default.*` file,
//! then `VITRYNA_`-prefixed environment variables (`__` as section
//! separator, e.g. `VITRYNA_SERVER__PORT=8081`). A `.env` file in the
//! working directory is honored via dotenvy.

use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub index: IndexConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Redis connection URL for the facet index store
    pub redis_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter applied to this crate (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON-formatted logs instead of human-readable output
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// Rotation schedule: daily, hourly, minutely, never
    pub file_rotation: String,
}

impl Config {
    /// Load configuration from defaults, optional file, and environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "postgres://localhost/vitryna")?
            .set_default("database.max_connections", 5)?
            .set_default("index.redis_url", "redis://127.0.0.1:6379")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("logging.file_enabled", false)?
            .set_default("logging.file_directory", "logs")?
            .set_default("logging.file_prefix", "catalog")?
            .set_default("logging.file_rotation", "daily")?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("VITRYNA").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate configuration values that serde cannot check structurally
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }
        if !matches!(
            self.logging.file_rotation.as_str(),
            "daily" | "hourly" | "minutely" | "never"
        ) {
            return Err(format!(
                "logging.file_rotation must be daily, hourly, minutely or never (got {})",
                self.logging.file_rotation
            ));
        }
        Ok(())
    }

    /// Resolve the listen address for the HTTP server
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid server.host/server.port: {e}"))
    }
}
