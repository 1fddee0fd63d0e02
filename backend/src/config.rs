//! Configuration management for the Taskboard server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with TASKBOARD__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Public URL of the web client, used in mailed links
    pub frontend_url: String,

    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub cloudinary: CloudinaryConfig,
    pub zego: ZegoConfig,
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
pub struct SessionConfig {
    /// Cookie carrying the session id
    pub cookie_name: String,

    /// Inactivity period after which a session expires
    pub expiry_days: i64,

    /// Send the cookie over HTTPS only
    pub secure: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing password-reset tokens
    pub secret: String,

    /// Reset token expiration in seconds
    pub reset_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// When false, outgoing mail is logged instead of sent
    pub enabled: bool,
    pub smtp_host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZegoConfig {
    pub app_id: u32,
    pub server_secret: String,

    /// Video token lifetime in seconds
    pub token_ttl: i64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("TASKBOARD_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("frontend_url", "http://localhost:5173")?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("session.cookie_name", "taskboard.sid")?
            .set_default("session.expiry_days", 7)?
            .set_default("session.secure", false)?
            .set_default("jwt.reset_token_expiry", 600)?
            .set_default("mail.enabled", false)?
            .set_default("mail.smtp_host", "smtp.gmail.com")?
            .set_default("mail.username", "")?
            .set_default("mail.password", "")?
            .set_default("mail.from", "no-reply@taskboard.local")?
            .set_default("cloudinary.cloud_name", "")?
            .set_default("cloudinary.api_key", "")?
            .set_default("cloudinary.api_secret", "")?
            .set_default("cloudinary.base_url", "https://api.cloudinary.com/v1_1")?
            .set_default("zego.app_id", 0)?
            .set_default("zego.server_secret", "")?
            .set_default("zego.token_ttl", 3600)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (TASKBOARD__ prefix)
            .add_source(
                Environment::with_prefix("TASKBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
