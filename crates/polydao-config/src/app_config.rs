//! Application configuration structures.

use crate::{ConfigValidationError, Driver, ParseDriverError};
use config::Config;
use polydao_core::{DaoError, DaoResult, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings of one storage backend.
///
/// Consumed once when the backend's connection provider is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Driver key (`postgresql`, `mysql`, `sqlite`, `mongodb`).
    pub driver: String,
    /// Server host name. Unused by SQLite.
    pub hostname: String,
    /// Server port; the driver's conventional port when unset.
    pub port: Option<u16>,
    /// Database name, or the database file path for SQLite.
    pub database: String,
    /// User name. Credentials are omitted from the URL when empty.
    pub username: String,
    /// Password.
    pub password: String,
    /// Connection pool tuning.
    pub pool: PoolConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: Driver::Sqlite.key().to_string(),
            hostname: "localhost".to_string(),
            port: None,
            database: "polydao.db".to_string(),
            username: String::new(),
            password: String::new(),
            pool: PoolConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Builds a configuration from flat `key = value` properties.
    ///
    /// Nested pool settings use dotted keys (`pool.max_connections`).
    /// Unknown keys are ignored; missing keys take their defaults.
    pub fn from_properties(properties: &HashMap<String, String>) -> DaoResult<Self> {
        let mut builder = Config::builder();
        for (key, value) in properties {
            builder = builder
                .set_override(key.as_str(), value.as_str())
                .map_err(|e| DaoError::connection(format!("invalid storage property '{key}': {e}")))?;
        }

        builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| DaoError::connection(format!("invalid storage configuration: {e}")))
    }

    /// Parses the driver key.
    pub fn driver(&self) -> Result<Driver, ParseDriverError> {
        self.driver.parse()
    }

    /// Returns the configured port, falling back to the driver's default.
    pub fn effective_port(&self) -> Option<u16> {
        self.port
            .or_else(|| self.driver().ok().and_then(Driver::default_port))
    }

    /// Renders the connection URL for the configured driver.
    ///
    /// SQLite URLs open the database file in read-write-create mode.
    pub fn connection_url(&self) -> Result<String, ConfigValidationError> {
        let driver = self
            .driver()
            .map_err(|_| ConfigValidationError::UnknownDriver {
                value: self.driver.clone(),
            })?;

        if driver == Driver::Sqlite {
            return Ok(if self.database == ":memory:" {
                "sqlite::memory:".to_string()
            } else {
                format!("sqlite://{}?mode=rwc", self.database)
            });
        }

        let invalid = |message: String| ConfigValidationError::InvalidUrl {
            url_type: driver.key().to_string(),
            message,
        };

        let mut url = Url::parse(&format!("{}://{}", url_scheme(driver), self.hostname))
            .map_err(|e| invalid(e.to_string()))?;
        url.set_port(self.effective_port())
            .map_err(|()| invalid(format!("host '{}' cannot carry a port", self.hostname)))?;
        if !self.username.is_empty() {
            url.set_username(&self.username)
                .map_err(|()| invalid("username cannot be set".to_string()))?;
            url.set_password(Some(&self.password))
                .map_err(|()| invalid("password cannot be set".to_string()))?;
        }
        if driver != Driver::MongoDb {
            url.set_path(&self.database);
        }

        Ok(url.into())
    }
}

const fn url_scheme(driver: Driver) -> &'static str {
    match driver {
        Driver::PostgreSql => "postgres",
        Driver::MySql => "mysql",
        Driver::Sqlite => "sqlite",
        Driver::MongoDb => "mongodb",
    }
}

/// Connection pool tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// Connection acquisition timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds.
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds.
    pub max_lifetime_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 20,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl PoolConfig {
    /// Returns the connect timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the idle timeout as a Duration.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Returns the maximum connection lifetime as a Duration.
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}
