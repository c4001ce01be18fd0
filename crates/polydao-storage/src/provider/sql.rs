//! Pooled connections to relational backends.

use super::ConnectionProvider;
use crate::Dialect;
use async_trait::async_trait;
use parking_lot::RwLock;
use polydao_config::{ConfigValidator, Driver, PoolConfig, StorageConfig};
use polydao_core::{DaoError, DaoResult};
use sqlx::any::AnyPoolOptions;
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Connection pool over PostgreSQL, MySQL or SQLite.
///
/// The concrete driver is selected at runtime from the connection URL.
pub struct SqlProvider {
    driver: Driver,
    dialect: Dialect,
    url: String,
    pool_config: PoolConfig,
    pool: RwLock<Option<AnyPool>>,
    lifecycle: Mutex<()>,
}

impl SqlProvider {
    /// Creates an unopened provider after validating the configuration.
    pub fn new(config: &StorageConfig) -> DaoResult<Self> {
        ConfigValidator::ensure_storage(config)?;

        let driver = config
            .driver()
            .map_err(|e| DaoError::connection(e.to_string()))?;
        let dialect = Dialect::for_driver(driver).ok_or_else(|| {
            DaoError::connection(format!("driver '{driver}' is not a relational driver"))
        })?;
        let url = config
            .connection_url()
            .map_err(|e| DaoError::connection(e.to_string()))?;

        Ok(Self {
            driver,
            dialect,
            url,
            pool_config: config.pool.clone(),
            pool: RwLock::new(None),
            lifecycle: Mutex::new(()),
        })
    }

    /// Creates and opens a provider.
    pub async fn connect(config: &StorageConfig) -> DaoResult<Arc<Self>> {
        let provider = Self::new(config)?;
        provider.init().await?;
        Ok(Arc::new(provider))
    }

    /// Returns the SQL dialect of the configured driver.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns true while the pool is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pool.read().is_some()
    }

    fn pool(&self) -> DaoResult<AnyPool> {
        self.pool
            .read()
            .clone()
            .ok_or_else(|| DaoError::connection(format!("{} provider is not open", self.driver)))
    }
}

#[async_trait]
impl ConnectionProvider for SqlProvider {
    type Handle = PoolConnection<Any>;

    fn driver(&self) -> Driver {
        self.driver
    }

    async fn init(&self) -> DaoResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_open() {
            return Ok(());
        }

        sqlx::any::install_default_drivers();
        info!(driver = %self.driver, "Opening SQL connection pool...");

        let pool = AnyPoolOptions::new()
            .min_connections(self.pool_config.min_connections)
            .max_connections(self.pool_config.max_connections)
            .acquire_timeout(self.pool_config.connect_timeout())
            .idle_timeout(Some(self.pool_config.idle_timeout()))
            .max_lifetime(Some(self.pool_config.max_lifetime()))
            .connect(&self.url)
            .await
            .map_err(|e| {
                warn!(driver = %self.driver, "Failed to connect to database: {}", e);
                DaoError::connection(format!("failed to connect: {e}"))
            })?;

        *self.pool.write() = Some(pool);
        info!(
            driver = %self.driver,
            max_connections = self.pool_config.max_connections,
            "SQL connection pool established"
        );
        Ok(())
    }

    async fn acquire(&self) -> DaoResult<Self::Handle> {
        let pool = self.pool()?;
        pool.acquire().await.map_err(|e| {
            warn!(driver = %self.driver, "Failed to acquire connection: {}", e);
            DaoError::connection(format!("failed to acquire connection: {e}"))
        })
    }

    async fn is_healthy(&self) -> bool {
        let Ok(pool) = self.pool() else {
            return false;
        };
        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => true,
            Err(e) => {
                debug!(driver = %self.driver, "Health check failed: {}", e);
                false
            }
        }
    }

    async fn shutdown(&self) -> DaoResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        let pool = self.pool.write().take();
        if let Some(pool) = pool {
            info!(driver = %self.driver, "Closing SQL connection pool...");
            pool.close().await;
            info!(driver = %self.driver, "SQL connection pool closed");
        }
        Ok(())
    }
}

impl fmt::Debug for SqlProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlProvider")
            .field("driver", &self.driver)
            .field("dialect", &self.dialect)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}
