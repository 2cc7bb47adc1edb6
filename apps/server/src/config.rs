//! Server configuration.
//!
//! Layered with the `config` crate, later layers winning:
//!
//! ```text
//! built-in defaults
//!     └── medisync.toml          (optional; path from MEDISYNC_CONFIG)
//!           └── MEDISYNC_* env   (MEDISYNC_PORT=8080, MEDISYNC_JWT_SECRET=...)
//! ```

use std::env;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Signing secret used when none is configured. Fine for a laptop, never
/// for a shared deployment.
pub const DEV_JWT_SECRET: &str = "medisync-dev-secret-change-in-production";

const DEFAULT_CONFIG_FILE: &str = "medisync.toml";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Secret key for signing session tokens
    pub jwt_secret: String,

    /// Session (and token) lifetime in seconds
    pub session_lifetime_secs: i64,

    /// SQLite pool size
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_path: PathBuf::from("medisync.db"),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_lifetime_secs: 8 * 60 * 60,
            max_connections: 5,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then the optional config file, then environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var("MEDISYNC_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let defaults = ServerConfig::default();

        let settings = Config::builder()
            .set_default("host", defaults.host.clone())?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path.display().to_string())?
            .set_default("jwt_secret", defaults.jwt_secret.clone())?
            .set_default("session_lifetime_secs", defaults.session_lifetime_secs)?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("MEDISYNC").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "jwt_secret",
                reason: "must not be empty".to_string(),
            });
        }
        if self.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "session_lifetime_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set MEDISYNC_JWT_SECRET");
        }

        Ok(())
    }

    /// `host:port` for the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
