//! Relational DAO engine.

use crate::codec::sql::{bind_value, decode_column};
use crate::provider::ConnectionProvider;
use crate::{SqlProvider, Statements};
use async_trait::async_trait;
use futures::TryStreamExt;
use polydao_core::{describe, Dao, DaoError, DaoResult, Entity, EntityDescriptor};
use sqlx::any::AnyRow;
use sqlx::Row;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// DAO over a relational table named after the entity.
///
/// Columns are the entity's persisted fields; the key field is the primary
/// key. Every operation holds one pooled connection for its duration.
pub struct SqlDao<E> {
    provider: Arc<SqlProvider>,
    descriptor: Arc<EntityDescriptor>,
    statements: Statements,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SqlDao<E> {
    /// Creates a DAO, rendering its statements for the provider's dialect.
    pub fn new(provider: Arc<SqlProvider>) -> DaoResult<Self> {
        let descriptor = describe::<E>()?;
        let statements = Statements::render(provider.dialect(), &descriptor);

        Ok(Self {
            provider,
            descriptor,
            statements,
            _entity: PhantomData,
        })
    }

    /// Returns the rendered statements.
    #[must_use]
    pub fn statements(&self) -> &Statements {
        &self.statements
    }

    /// Creates the entity's table if it does not exist.
    pub async fn ensure_table(&self) -> DaoResult<()> {
        let mut conn = self.provider.acquire().await?;
        sqlx::query(&self.statements.create_table)
            .execute(&mut *conn)
            .await
            .map_err(|e| self.failure("ensure_table", e))?;

        info!(table = self.descriptor.name(), "Table ensured");
        Ok(())
    }

    fn decode_row(&self, row: &AnyRow) -> DaoResult<E> {
        let values = self
            .descriptor
            .fields()
            .iter()
            .enumerate()
            .map(|(index, field)| decode_column(row, index, field))
            .collect::<DaoResult<Vec<_>>>()?;
        self.descriptor.hydrate(values)
    }

    fn failure(&self, operation: &str, err: sqlx::Error) -> DaoError {
        let err = DaoError::from(err);
        warn!(
            table = self.descriptor.name(),
            operation,
            code = err.error_code(),
            "SQL operation failed: {}",
            err
        );
        err
    }
}

#[async_trait]
impl<E: Entity> Dao<E> for SqlDao<E> {
    async fn save(&self, entities: &[E]) -> DaoResult<()> {
        debug!(table = self.descriptor.name(), count = entities.len(), "Saving entities");

        let mut conn = self.provider.acquire().await?;
        for entity in entities {
            let values = self.descriptor.project(&entity.to_record()?)?;

            let mut query = sqlx::query(&self.statements.upsert);
            for (field, value) in self.descriptor.fields().iter().zip(values) {
                query = bind_value(query, value, field.field_type());
            }
            query
                .execute(&mut *conn)
                .await
                .map_err(|e| self.failure("save", e))?;
        }
        Ok(())
    }

    async fn delete(&self, entities: &[E]) -> DaoResult<()> {
        debug!(table = self.descriptor.name(), count = entities.len(), "Deleting entities");

        let key_type = self.descriptor.key_field().field_type();
        let mut conn = self.provider.acquire().await?;
        for entity in entities {
            let key = self.descriptor.key_value(&entity.to_record()?)?;
            bind_value(sqlx::query(&self.statements.delete), key, key_type)
                .execute(&mut *conn)
                .await
                .map_err(|e| self.failure("delete", e))?;
        }
        Ok(())
    }

    async fn contains(&self, key: &E::Key) -> DaoResult<bool> {
        let key = self.descriptor.encode_key(key)?;
        debug!(table = self.descriptor.name(), key = %key, "Checking entity");

        let mut conn = self.provider.acquire().await?;
        let row = bind_value(
            sqlx::query(&self.statements.count),
            key,
            self.descriptor.key_field().field_type(),
        )
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| self.failure("contains", e))?;

        let count: i64 = row
            .try_get_unchecked(0)
            .map_err(|e| self.failure("contains", e))?;
        Ok(count >= 1)
    }

    async fn find(&self, key: &E::Key) -> DaoResult<E> {
        let key = self.descriptor.encode_key(key)?;
        debug!(table = self.descriptor.name(), key = %key, "Finding entity");

        let mut conn = self.provider.acquire().await?;
        let row = bind_value(
            sqlx::query(&self.statements.select_one),
            key.clone(),
            self.descriptor.key_field().field_type(),
        )
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| self.failure("find", e))?;

        match row {
            Some(row) => self.decode_row(&row),
            None => Err(DaoError::not_found(self.descriptor.name(), &key)),
        }
    }

    async fn find_all(&self) -> DaoResult<Vec<E>> {
        debug!(table = self.descriptor.name(), "Scanning entities");

        let mut conn = self.provider.acquire().await?;
        let mut rows = sqlx::query(&self.statements.select_all).fetch(&mut *conn);

        let mut entities = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(|e| self.failure("find_all", e))? {
            entities.push(self.decode_row(&row)?);
        }
        Ok(entities)
    }
}
