//! Backend selection from configuration.

use crate::provider::ConnectionProvider;
use crate::{DocumentDao, MongoProvider, SqlDao, SqlProvider};
use futures::future::BoxFuture;
use futures::FutureExt;
use once_cell::sync::Lazy;
use polydao_config::{Driver, StorageConfig};
use polydao_core::{Dao, DaoError, DaoResult, Entity};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Opens a started backend from its configuration.
pub type StorageConstructor = for<'a> fn(&'a StorageConfig) -> BoxFuture<'a, DaoResult<Storage>>;

static REGISTRY: Lazy<StorageRegistry> = Lazy::new(StorageRegistry::with_defaults);

/// A started storage backend.
#[derive(Debug, Clone)]
pub enum Storage {
    /// PostgreSQL, MySQL or SQLite.
    Sql(Arc<SqlProvider>),
    /// MongoDB.
    Document(Arc<MongoProvider>),
}

impl Storage {
    /// Returns the backend's driver.
    #[must_use]
    pub fn driver(&self) -> Driver {
        match self {
            Self::Sql(provider) => provider.driver(),
            Self::Document(provider) => provider.driver(),
        }
    }

    /// Returns a DAO for `E` bound to this backend.
    ///
    /// The document backend opens (or creates) the entity's collection.
    pub async fn dao<E: Entity>(&self) -> DaoResult<Arc<dyn Dao<E>>> {
        let dao: Arc<dyn Dao<E>> = match self {
            Self::Sql(provider) => Arc::new(SqlDao::<E>::new(Arc::clone(provider))?),
            Self::Document(provider) => Arc::new(DocumentDao::<E>::open(provider).await?),
        };
        Ok(dao)
    }

    /// Returns a SQL DAO whose table has been created if missing.
    ///
    /// Fails with a connection error on the document backend, which needs
    /// no table setup.
    pub async fn sql_dao<E: Entity>(&self) -> DaoResult<SqlDao<E>> {
        match self {
            Self::Sql(provider) => {
                let dao = SqlDao::new(Arc::clone(provider))?;
                dao.ensure_table().await?;
                Ok(dao)
            }
            Self::Document(_) => Err(DaoError::connection(format!(
                "driver '{}' has no tables",
                self.driver()
            ))),
        }
    }

    /// Round-trips the backend.
    pub async fn is_healthy(&self) -> bool {
        match self {
            Self::Sql(provider) => provider.is_healthy().await,
            Self::Document(provider) => provider.is_healthy().await,
        }
    }

    /// Closes the backend's connections.
    pub async fn shutdown(&self) -> DaoResult<()> {
        match self {
            Self::Sql(provider) => provider.shutdown().await,
            Self::Document(provider) => provider.shutdown().await,
        }
    }
}

/// Immutable map from driver to backend constructor.
pub struct StorageRegistry {
    constructors: HashMap<Driver, StorageConstructor>,
}

impl StorageRegistry {
    /// Creates a registry with every built-in backend.
    #[must_use]
    pub fn with_defaults() -> Self {
        let sql: StorageConstructor = start_sql;
        let document: StorageConstructor = start_document;

        let constructors = Driver::ALL
            .into_iter()
            .map(|driver| (driver, if driver.is_document() { document } else { sql }))
            .collect();
        Self { constructors }
    }

    /// Creates a registry from explicit constructors.
    #[must_use]
    pub fn from_constructors(constructors: HashMap<Driver, StorageConstructor>) -> Self {
        Self { constructors }
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    /// Returns the registered drivers.
    #[must_use]
    pub fn drivers(&self) -> Vec<Driver> {
        let mut drivers: Vec<Driver> = self.constructors.keys().copied().collect();
        drivers.sort_by_key(|driver| driver.key());
        drivers
    }

    /// Resolves a driver key to its constructor.
    pub fn resolve(&self, key: &str) -> DaoResult<StorageConstructor> {
        let driver: Driver = key.parse().map_err(|e: polydao_config::ParseDriverError| {
            warn!(driver = key, "Unknown storage driver");
            DaoError::connection(e.to_string())
        })?;
        self.constructors.get(&driver).copied().ok_or_else(|| {
            DaoError::connection(format!("no storage backend registered for '{driver}'"))
        })
    }

    /// Starts the backend named by the configuration's driver key.
    pub async fn start(&self, config: &StorageConfig) -> DaoResult<Storage> {
        let constructor = self.resolve(&config.driver)?;
        let storage = constructor(config).await?;
        info!(driver = %storage.driver(), "Storage started");
        Ok(storage)
    }

    /// Starts a backend from flat `key = value` properties.
    pub async fn start_from_properties(
        &self,
        properties: &HashMap<String, String>,
    ) -> DaoResult<Storage> {
        let config = StorageConfig::from_properties(properties)?;
        self.start(&config).await
    }
}

fn start_sql(config: &StorageConfig) -> BoxFuture<'_, DaoResult<Storage>> {
    async move { Ok(Storage::Sql(SqlProvider::connect(config).await?)) }.boxed()
}

fn start_document(config: &StorageConfig) -> BoxFuture<'_, DaoResult<Storage>> {
    async move { Ok(Storage::Document(MongoProvider::connect(config).await?)) }.boxed()
}

/// Starts a backend through the process-wide registry.
pub async fn start(config: &StorageConfig) -> DaoResult<Storage> {
    StorageRegistry::global().start(config).await
}
