//! Document DAO engine.

use super::{DocumentCollection, MongoCollection};
use crate::codec::bson::{from_bson, to_bson};
use crate::provider::ConnectionProvider;
use crate::MongoProvider;
use async_trait::async_trait;
use bson::{Bson, Document};
use polydao_core::{describe, Dao, DaoError, DaoResult, Entity, EntityDescriptor};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

const ID: &str = "_id";

/// DAO over a document collection named after the entity.
///
/// Each entity is one document: `_id` holds the key and every persisted
/// field is stored under its own name.
pub struct DocumentDao<E, C = MongoCollection> {
    descriptor: Arc<EntityDescriptor>,
    collection: C,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> DocumentDao<E> {
    /// Opens the entity's collection on the provider's database.
    pub async fn open(provider: &MongoProvider) -> DaoResult<Self> {
        let descriptor = describe::<E>()?;
        let database = provider.acquire().await?;
        let collection = MongoCollection::open(&database, descriptor.name()).await?;
        debug!(entity = descriptor.name(), collection = collection.name(), "Collection opened");

        Ok(Self {
            descriptor,
            collection,
            _entity: PhantomData,
        })
    }
}

impl<E: Entity, C: DocumentCollection> DocumentDao<E, C> {
    /// Creates a DAO over an already opened collection.
    pub fn with_collection(collection: C) -> DaoResult<Self> {
        Ok(Self {
            descriptor: describe::<E>()?,
            collection,
            _entity: PhantomData,
        })
    }

    /// Returns the underlying collection.
    pub fn collection(&self) -> &C {
        &self.collection
    }

    fn encode_document(&self, entity: &E) -> DaoResult<(Bson, Document)> {
        let values = self.descriptor.project(&entity.to_record()?)?;
        let id = to_bson(
            values[self.descriptor.key_index()].clone(),
            self.descriptor.key_field(),
        )?;

        let mut document = Document::new();
        document.insert(ID, id.clone());
        for (field, value) in self.descriptor.fields().iter().zip(values) {
            document.insert(field.name(), to_bson(value, field)?);
        }
        Ok((id, document))
    }

    fn decode_document(&self, mut document: Document) -> DaoResult<E> {
        let key_index = self.descriptor.key_index();
        let values = self
            .descriptor
            .fields()
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let mut stored = document.remove(field.name());
                if stored.is_none() && index == key_index {
                    stored = document.get(ID).cloned();
                }
                from_bson(stored.unwrap_or(Bson::Null), field)
            })
            .collect::<DaoResult<Vec<_>>>()?;
        self.descriptor.hydrate(values)
    }

    fn entity_id(&self, entity: &E) -> DaoResult<Bson> {
        let key = self.descriptor.key_value(&entity.to_record()?)?;
        to_bson(key, self.descriptor.key_field())
    }

    fn key_id(&self, key: &E::Key) -> DaoResult<Bson> {
        to_bson(self.descriptor.encode_key(key)?, self.descriptor.key_field())
    }

    fn failure(&self, operation: &str, err: DaoError) -> DaoError {
        warn!(
            collection = self.descriptor.name(),
            operation,
            code = err.error_code(),
            "Document operation failed: {}",
            err
        );
        err
    }
}

#[async_trait]
impl<E: Entity, C: DocumentCollection> Dao<E> for DocumentDao<E, C> {
    async fn save(&self, entities: &[E]) -> DaoResult<()> {
        debug!(collection = self.descriptor.name(), count = entities.len(), "Saving entities");

        for entity in entities {
            let (id, document) = self.encode_document(entity)?;
            self.collection
                .replace_one(id, document)
                .await
                .map_err(|e| self.failure("save", e))?;
        }
        Ok(())
    }

    async fn delete(&self, entities: &[E]) -> DaoResult<()> {
        debug!(collection = self.descriptor.name(), count = entities.len(), "Deleting entities");

        for entity in entities {
            let id = self.entity_id(entity)?;
            self.collection
                .delete_one(id)
                .await
                .map_err(|e| self.failure("delete", e))?;
        }
        Ok(())
    }

    async fn contains(&self, key: &E::Key) -> DaoResult<bool> {
        let id = self.key_id(key)?;
        debug!(collection = self.descriptor.name(), id = %id, "Checking entity");

        let count = self
            .collection
            .count(id)
            .await
            .map_err(|e| self.failure("contains", e))?;
        Ok(count >= 1)
    }

    async fn find(&self, key: &E::Key) -> DaoResult<E> {
        let key = self.descriptor.encode_key(key)?;
        let id = to_bson(key.clone(), self.descriptor.key_field())?;
        debug!(collection = self.descriptor.name(), id = %id, "Finding entity");

        let document = self
            .collection
            .find_one(id)
            .await
            .map_err(|e| self.failure("find", e))?;

        match document {
            Some(document) => self.decode_document(document),
            None => Err(DaoError::not_found(self.descriptor.name(), &key)),
        }
    }

    async fn find_all(&self) -> DaoResult<Vec<E>> {
        debug!(collection = self.descriptor.name(), "Scanning entities");

        self.collection
            .find_all()
            .await
            .map_err(|e| self.failure("find_all", e))?
            .into_iter()
            .map(|document| self.decode_document(document))
            .collect()
    }
}
