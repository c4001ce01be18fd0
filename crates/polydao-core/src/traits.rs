//! The backend-agnostic data-access contract.

use crate::{DaoResult, Entity};
use async_trait::async_trait;

/// Data access object for one entity type.
///
/// SQL and document engines implement this identically: same signatures,
/// same error kinds. The backend is fixed when the DAO is constructed.
///
/// Batch operations process entities in order and stop at the first failure.
/// Entities before the failing one stay persisted; later ones are not
/// attempted.
#[async_trait]
pub trait Dao<E: Entity>: Send + Sync {
    /// Inserts or replaces each entity by key.
    async fn save(&self, entities: &[E]) -> DaoResult<()>;

    /// Deletes each entity by key. Absent keys are not an error.
    async fn delete(&self, entities: &[E]) -> DaoResult<()>;

    /// Checks whether a stored representation exists for the key.
    async fn contains(&self, key: &E::Key) -> DaoResult<bool>;

    /// Loads the entity stored under the key.
    ///
    /// Fails with [`DaoError::NotFound`](crate::DaoError::NotFound) when absent.
    async fn find(&self, key: &E::Key) -> DaoResult<E>;

    /// Loads every stored entity in the backend's natural order.
    async fn find_all(&self) -> DaoResult<Vec<E>>;

    /// Saves a single entity.
    async fn save_one(&self, entity: &E) -> DaoResult<()> {
        self.save(std::slice::from_ref(entity)).await
    }

    /// Deletes a single entity.
    async fn delete_one(&self, entity: &E) -> DaoResult<()> {
        self.delete(std::slice::from_ref(entity)).await
    }
}
