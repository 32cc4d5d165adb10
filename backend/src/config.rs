//! Configuration management for the Kombucha Tracker server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides, `KT__` prefix and `__` between keys
//!    (`KT__SERVER__PORT=8080`)

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Prefix for environment overrides; keys are joined with `__`
const ENV_PREFIX: &str = "KT";

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Insert a demo batch at startup (development only)
    pub seed_demo_data: bool,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Text-generation service used for batch analysis
    pub text_generation: TextGenerationConfig,

    /// Limits applied in front of the text-generation service
    pub rate_limit: RateLimitConfig,
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
pub struct TextGenerationConfig {
    /// Chat-completions endpoint; analysis is disabled when empty
    pub api_endpoint: String,

    /// Bearer token for the endpoint
    pub api_key: String,

    /// Model name sent with each request
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TextGenerationConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_endpoint.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var(format!("{}__ENVIRONMENT", ENV_PREFIX))
            .unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("seed_demo_data", false)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("text_generation.api_endpoint", "")?
            .set_default("text_generation.api_key", "")?
            .set_default("text_generation.model", "gpt-4o-mini")?
            .set_default("text_generation.timeout_secs", 60)?
            .set_default("rate_limit.max_requests", 10)?
            .set_default("rate_limit.window_secs", 60)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (KT__SECTION__KEY)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
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

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}
