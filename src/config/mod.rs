//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PAYMENT_FANOUT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use payment_fanout::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod broadcast;
mod error;
mod redis;
mod server;
mod webhook;

pub use broadcast::BroadcastConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::{WebhookConfig, WebhookMode};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
/// Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, instance identity)
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis configuration (connection registry and event channel)
    pub redis: RedisConfig,

    /// Webhook verification (mode, secrets, tolerance)
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Broadcast channel and registry settings
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAYMENT_FANOUT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYMENT_FANOUT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYMENT_FANOUT__WEBHOOK__SIGNING_SECRET=...` -> `webhook.signing_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYMENT_FANOUT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid,
    /// including when no webhook secret is configured at all.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.redis.validate()?;
        self.webhook.validate()?;
        self.broadcast.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PAYMENT_FANOUT__REDIS__URL",
        "PAYMENT_FANOUT__WEBHOOK__SIGNING_SECRET",
        "PAYMENT_FANOUT__WEBHOOK__PROVIDER_ENDPOINT_SECRET",
        "PAYMENT_FANOUT__WEBHOOK__MODE",
        "PAYMENT_FANOUT__WEBHOOK__TOLERANCE_SECS",
        "PAYMENT_FANOUT__SERVER__PORT",
        "PAYMENT_FANOUT__SERVER__ENVIRONMENT",
        "PAYMENT_FANOUT__BROADCAST__CHANNEL",
    ];

    /// Helper to set environment variables for testing
    fn set_minimal_env() {
        env::set_var("PAYMENT_FANOUT__REDIS__URL", "redis://localhost:6379");
        env::set_var("PAYMENT_FANOUT__WEBHOOK__SIGNING_SECRET", "s3cr3t");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert_eq!(config.webhook.signing_secret.as_deref(), Some("s3cr3t"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.webhook.tolerance_secs, 300);
        assert_eq!(config.webhook.signature_header, "X-Signature");
        assert_eq!(config.broadcast.channel, "payment-events");
    }

    #[test]
    fn test_missing_secret_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PAYMENT_FANOUT__REDIS__URL", "redis://localhost:6379");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::NoWebhookSecretConfigured)
        );
    }

    #[test]
    fn test_provider_mode_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYMENT_FANOUT__WEBHOOK__MODE", "provider_timestamped");
        env::set_var("PAYMENT_FANOUT__WEBHOOK__PROVIDER_ENDPOINT_SECRET", "whsec_test");
        env::set_var("PAYMENT_FANOUT__WEBHOOK__TOLERANCE_SECS", "120");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.webhook.mode, Some(WebhookMode::ProviderTimestamped));
        assert_eq!(config.webhook.tolerance_secs, 120);
        assert_eq!(
            config.webhook.verification_mode().unwrap().name(),
            "provider_timestamped"
        );
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYMENT_FANOUT__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }
}
