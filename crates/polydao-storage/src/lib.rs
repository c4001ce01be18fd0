//! # Polydao Storage
//!
//! Storage engines behind the [`Dao`](polydao_core::Dao) contract.
//!
//! A [`Storage`] is started from a [`StorageConfig`](polydao_config::StorageConfig)
//! through the [`StorageRegistry`], which maps the configured driver key to a
//! constructor. SQL drivers share one engine ([`SqlDao`] over a
//! [`SqlProvider`] pool); MongoDB is served by [`DocumentDao`] over a
//! [`MongoProvider`].
//!
//! ```no_run
//! # use polydao_config::StorageConfig;
//! # async fn run() -> polydao_core::DaoResult<()> {
//! let config = StorageConfig {
//!     driver: "sqlite".to_string(),
//!     database: "app.db".to_string(),
//!     ..StorageConfig::default()
//! };
//! let storage = polydao_storage::start(&config).await?;
//! assert!(storage.is_healthy().await);
//! storage.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod dao;
pub mod dialect;
pub mod factory;
pub mod provider;

pub use dao::{DocumentCollection, DocumentDao, MongoCollection, SqlDao};
pub use dialect::{Dialect, Statements};
pub use factory::{start, Storage, StorageRegistry};
pub use provider::{ConnectionProvider, MongoProvider, SqlProvider};
