//! Database configuration

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::error::ValidationError;

/// Storage engine backing the event store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    #[default]
    InMemory,
    Postgres,
}

impl DatabaseEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::InMemory => "inmemory",
            DatabaseEngine::Postgres => "postgres",
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseEngine {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inmemory" => Ok(DatabaseEngine::InMemory),
            "postgres" => Ok(DatabaseEngine::Postgres),
            other => Err(ValidationError::UnknownEngine(other.to_string())),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Engine the repository factory resolves at startup
    #[serde(default)]
    pub engine: DatabaseEngine,

    /// PostgreSQL connection URL (postgres engine only)
    #[serde(default)]
    pub url: String,

    /// Minimum connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Maximum connections allowed
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Deadline for a single event store operation in seconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    /// Run migrations on startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get operation timeout as Duration
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Validate database configuration
    ///
    /// Connection settings are only checked for the postgres engine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.operation_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.engine != DatabaseEngine::Postgres {
            return Ok(());
        }
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE_URL"));
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > 100 {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: DatabaseEngine::default(),
            url: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            operation_timeout_secs: default_operation_timeout(),
            run_migrations: false,
        }
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_operation_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postgres(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            engine: DatabaseEngine::Postgres,
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_database_config_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.engine, DatabaseEngine::InMemory);
        assert_eq!(config.max_connections, 10);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_timeout_durations() {
        let config = DatabaseConfig {
            acquire_timeout_secs: 5,
            operation_timeout_secs: 2,
            ..Default::default()
        };
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
        assert_eq!(config.operation_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_inmemory_needs_no_url() {
        assert!(DatabaseConfig::default().validate().is_ok());
    }

    #[test]
    fn test_postgres_requires_url() {
        assert!(matches!(
            postgres("").validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_validation_invalid_url() {
        assert!(matches!(
            postgres("mysql://localhost/test").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
        assert!(postgres("postgresql://localhost/test").validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_pool_size() {
        let config = DatabaseConfig {
            min_connections: 20,
            max_connections: 10,
            ..postgres("postgres://localhost/test")
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPoolSize)));
    }

    #[test]
    fn test_zero_operation_timeout_is_rejected() {
        let config = DatabaseConfig {
            operation_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_parsing() {
        assert_eq!("postgres".parse::<DatabaseEngine>().unwrap(), DatabaseEngine::Postgres);
        assert_eq!("inmemory".parse::<DatabaseEngine>().unwrap(), DatabaseEngine::InMemory);
        assert!("mongodb".parse::<DatabaseEngine>().is_err());
        assert_eq!(DatabaseEngine::InMemory.to_string(), "inmemory");
    }
}
