//! Storage driver keys.

use std::fmt;
use std::str::FromStr;

/// Storage backend selected by the `driver` configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// PostgreSQL over the SQL engine.
    PostgreSql,
    /// MySQL / MariaDB over the SQL engine.
    MySql,
    /// SQLite database file over the SQL engine.
    Sqlite,
    /// MongoDB over the document engine.
    MongoDb,
}

impl Driver {
    /// Every supported driver.
    pub const ALL: [Self; 4] = [Self::PostgreSql, Self::MySql, Self::Sqlite, Self::MongoDb];

    /// Returns the canonical configuration key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::MongoDb => "mongodb",
        }
    }

    /// Returns true if the driver is served by the document engine.
    #[must_use]
    pub const fn is_document(self) -> bool {
        matches!(self, Self::MongoDb)
    }

    /// Returns true if the driver talks to a network server.
    #[must_use]
    pub const fn is_networked(self) -> bool {
        !matches!(self, Self::Sqlite)
    }

    /// Returns the server's conventional port.
    #[must_use]
    pub const fn default_port(self) -> Option<u16> {
        match self {
            Self::PostgreSql => Some(5432),
            Self::MySql => Some(3306),
            Self::MongoDb => Some(27017),
            Self::Sqlite => None,
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The configured driver key names no supported backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDriverError {
    value: String,
}

impl ParseDriverError {
    /// Returns the rejected key.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ParseDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported storage driver '{}' (valid: postgresql, mysql, sqlite, mongodb)",
            self.value
        )
    }
}

impl std::error::Error for ParseDriverError {}

impl FromStr for Driver {
    type Err = ParseDriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "pgsql" => Ok(Self::PostgreSql),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            _ => Err(ParseDriverError {
                value: s.to_string(),
            }),
        }
    }
}
