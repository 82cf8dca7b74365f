//! Service configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Identity and logging settings of the running service
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name attached to logs and command spans
    #[serde(default = "default_name")]
    pub name: String,

    /// Environment name
    #[serde(default)]
    pub environment: Environment,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Application environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl ServiceConfig {
    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Validate service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyServiceName);
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            environment: Environment::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_name() -> String {
    "assets".to_string()
}

fn default_log_level() -> String {
    "info,assetflow=debug,sqlx=warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.name, "assets");
        assert_eq!(config.environment, Environment::Development);
        assert!(config.log_level.contains("assetflow=debug"));
    }

    #[test]
    fn test_is_production() {
        let mut config = ServiceConfig::default();
        assert!(!config.is_production());

        config.environment = Environment::Production;
        assert!(config.is_production());
    }

    #[test]
    fn test_validation_empty_name() {
        let config = ServiceConfig {
            name: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
