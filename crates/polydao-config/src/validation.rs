//! Configuration validation module.
//!
//! Checks storage and logging settings up front so a bad configuration
//! fails at startup rather than on the first DAO call.

use crate::{AppConfig, Driver, PoolConfig, StorageConfig};
use polydao_core::{DaoError, LoggingConfig};
use std::fmt;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Driver key names no supported backend.
    UnknownDriver { value: String },
    /// Networked drivers need a host.
    MissingHostname,
    /// Port 0 is never a valid server port.
    InvalidPort { value: u16 },
    /// Database name (or SQLite file path) is empty.
    MissingDatabase,
    /// Pool bounds are inconsistent.
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds the maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Connection URL cannot be rendered.
    InvalidUrl { url_type: String, message: String },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDriver { value } => {
                write!(
                    f,
                    "Unsupported storage driver: '{}' (valid: postgresql, mysql, sqlite, mongodb)",
                    value
                )
            }
            Self::MissingHostname => write!(f, "Hostname is required for networked drivers"),
            Self::InvalidPort { value } => {
                write!(f, "Invalid storage port: {} (must be 1-65535)", value)
            }
            Self::MissingDatabase => write!(f, "Database name is required"),
            Self::InvalidPoolSize { min, max } => {
                write!(
                    f,
                    "Invalid pool size: min ({}) must be <= max ({}) and max must be positive",
                    min, max
                )
            }
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {} exceeds maximum allowed ({})", value, maximum)
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Returns true if validation passed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning every error found.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();

        Self::check_storage(&config.storage, &mut result);
        Self::check_logging(&config.logging, &mut result);

        result.into_result()
    }

    /// Validates storage settings alone.
    pub fn validate_storage(config: &StorageConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();
        Self::check_storage(config, &mut result);
        result.into_result()
    }

    /// Validates storage settings, folding every problem into one connection error.
    pub fn ensure_storage(config: &StorageConfig) -> Result<(), DaoError> {
        Self::validate_storage(config).map_err(|errors| DaoError::connection(join_errors(&errors)))
    }

    fn check_storage(config: &StorageConfig, result: &mut ValidationResult) {
        let driver = match config.driver() {
            Ok(driver) => Some(driver),
            Err(_) => {
                result.add_error(ConfigValidationError::UnknownDriver {
                    value: config.driver.clone(),
                });
                None
            }
        };

        if config.database.trim().is_empty() {
            result.add_error(ConfigValidationError::MissingDatabase);
        }

        if driver.is_some_and(Driver::is_networked) {
            if config.hostname.trim().is_empty() {
                result.add_error(ConfigValidationError::MissingHostname);
            }
            if config.port == Some(0) {
                result.add_error(ConfigValidationError::InvalidPort { value: 0 });
            }
            if result.is_valid() {
                if let Err(e) = config.connection_url() {
                    result.add_error(e);
                }
            }
        }

        Self::check_pool(&config.pool, result);
    }

    fn check_pool(pool: &PoolConfig, result: &mut ValidationResult) {
        if pool.max_connections == 0 || pool.min_connections > pool.max_connections {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                min: pool.min_connections,
                max: pool.max_connections,
            });
        }

        if pool.max_connections > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: pool.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        for (name, value) in [
            ("connect_timeout_secs", pool.connect_timeout_secs),
            ("idle_timeout_secs", pool.idle_timeout_secs),
            ("max_lifetime_secs", pool.max_lifetime_secs),
        ] {
            if value == 0 {
                result.add_error(ConfigValidationError::NonPositiveTimeout {
                    name: name.to_string(),
                    value,
                });
            }
        }
    }

    fn check_logging(config: &LoggingConfig, result: &mut ValidationResult) {
        let level = config.level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.level.clone(),
            });
        }
    }
}

/// Renders validation errors as one message.
pub(crate) fn join_errors(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
