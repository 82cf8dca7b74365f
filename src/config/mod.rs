//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ASSETFLOW` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use assetflow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Using the {} engine", config.database.engine);
//! ```

mod database;
mod error;
mod service;

pub use database::{DatabaseConfig, DatabaseEngine};
pub use error::{ConfigError, ValidationError};
pub use service::{Environment, ServiceConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Service identity and logging
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage engine and connection settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ASSETFLOW` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ASSETFLOW__DATABASE__ENGINE=postgres` -> `database.engine = postgres`
    /// - `ASSETFLOW__SERVICE__NAME=assets` -> `service.name = assets`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ASSETFLOW")
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
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.service.validate()?;
        self.database.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.service.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("ASSETFLOW__DATABASE__ENGINE");
        env::remove_var("ASSETFLOW__DATABASE__URL");
        env::remove_var("ASSETFLOW__DATABASE__OPERATION_TIMEOUT_SECS");
        env::remove_var("ASSETFLOW__SERVICE__NAME");
        env::remove_var("ASSETFLOW__SERVICE__ENVIRONMENT");
    }

    #[test]
    fn test_load_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.engine, DatabaseEngine::InMemory);
        assert_eq!(config.service.name, "assets");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_postgres_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ASSETFLOW__DATABASE__ENGINE", "postgres");
        env::set_var("ASSETFLOW__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("ASSETFLOW__DATABASE__OPERATION_TIMEOUT_SECS", "3");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.engine, DatabaseEngine::Postgres);
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.database.operation_timeout_secs, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ASSETFLOW__SERVICE__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_postgres_without_url_fails_validation() {
        let config = AppConfig {
            database: DatabaseConfig {
                engine: DatabaseEngine::Postgres,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
