//! Connection providers: the boundary where DAOs obtain live connections.

mod mongo;
mod sql;

pub use mongo::MongoProvider;
pub use sql::SqlProvider;

use async_trait::async_trait;
use polydao_config::Driver;
use polydao_core::DaoResult;

/// Supplies live connections to one backend and reports its health.
///
/// `init` and `shutdown` are mutually exclusive per provider. After
/// `shutdown`, `acquire` fails with a connection error until `init` runs
/// again.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// What `acquire` hands out: a pooled connection or a database handle.
    type Handle: Send;

    /// Returns the driver this provider was configured for.
    fn driver(&self) -> Driver;

    /// Opens the underlying pool or client. Idempotent while open.
    async fn init(&self) -> DaoResult<()>;

    /// Obtains a connection for one operation.
    async fn acquire(&self) -> DaoResult<Self::Handle>;

    /// Round-trips the backend. Never fails; unreachable means unhealthy.
    async fn is_healthy(&self) -> bool;

    /// Closes the pool or client. Idempotent.
    async fn shutdown(&self) -> DaoResult<()>;
}
