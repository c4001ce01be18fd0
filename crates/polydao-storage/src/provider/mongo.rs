//! MongoDB client provider.

use super::ConnectionProvider;
use async_trait::async_trait;
use bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use parking_lot::RwLock;
use polydao_config::{ConfigValidator, Driver, PoolConfig, StorageConfig};
use polydao_core::{DaoError, DaoResult};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// MongoDB client handing out handles to the configured database.
pub struct MongoProvider {
    url: String,
    database: String,
    pool_config: PoolConfig,
    client: RwLock<Option<Client>>,
    lifecycle: Mutex<()>,
}

impl MongoProvider {
    /// Creates an unopened provider after validating the configuration.
    pub fn new(config: &StorageConfig) -> DaoResult<Self> {
        ConfigValidator::ensure_storage(config)?;

        let driver = config
            .driver()
            .map_err(|e| DaoError::connection(e.to_string()))?;
        if !driver.is_document() {
            return Err(DaoError::connection(format!(
                "driver '{driver}' is not a document driver"
            )));
        }

        Ok(Self {
            url: config
                .connection_url()
                .map_err(|e| DaoError::connection(e.to_string()))?,
            database: config.database.clone(),
            pool_config: config.pool.clone(),
            client: RwLock::new(None),
            lifecycle: Mutex::new(()),
        })
    }

    /// Creates and opens a provider.
    pub async fn connect(config: &StorageConfig) -> DaoResult<Arc<Self>> {
        let provider = Self::new(config)?;
        provider.init().await?;
        Ok(Arc::new(provider))
    }

    /// Returns the configured database name.
    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Returns true while the client is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.client.read().is_some()
    }

    fn client(&self) -> DaoResult<Client> {
        self.client
            .read()
            .clone()
            .ok_or_else(|| DaoError::connection("mongodb provider is not open"))
    }
}

#[async_trait]
impl ConnectionProvider for MongoProvider {
    type Handle = Database;

    fn driver(&self) -> Driver {
        Driver::MongoDb
    }

    async fn init(&self) -> DaoResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_open() {
            return Ok(());
        }

        info!(database = %self.database, "Connecting to MongoDB...");

        let mut options = ClientOptions::parse(&self.url).await?;
        options.min_pool_size = Some(self.pool_config.min_connections);
        options.max_pool_size = Some(self.pool_config.max_connections);
        options.connect_timeout = Some(self.pool_config.connect_timeout());
        options.server_selection_timeout = Some(self.pool_config.connect_timeout());
        options.max_idle_time = Some(self.pool_config.idle_timeout());

        let client = Client::with_options(options)?;

        // The driver connects lazily; ping so an unreachable server fails here.
        if let Err(e) = client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
        {
            warn!("Failed to reach MongoDB: {}", e);
            client.shutdown().await;
            return Err(DaoError::connection(format!("failed to connect: {e}")));
        }

        *self.client.write() = Some(client);
        info!(database = %self.database, "MongoDB client established");
        Ok(())
    }

    async fn acquire(&self) -> DaoResult<Self::Handle> {
        Ok(self.client()?.database(&self.database))
    }

    async fn is_healthy(&self) -> bool {
        let Ok(client) = self.client() else {
            return false;
        };
        match client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }

    async fn shutdown(&self) -> DaoResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        let client = self.client.write().take();
        if let Some(client) = client {
            info!("Closing MongoDB client...");
            client.shutdown().await;
            info!("MongoDB client closed");
        }
        Ok(())
    }
}

impl fmt::Debug for MongoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoProvider")
            .field("database", &self.database)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}
