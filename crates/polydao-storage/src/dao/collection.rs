//! Keyed document collections.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use polydao_core::DaoResult;
use tracing::info;

/// Keyed operations of one document collection.
///
/// Documents are addressed by their `_id`.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Replaces the document with this id, inserting it if absent.
    async fn replace_one(&self, id: Bson, document: Document) -> DaoResult<()>;

    /// Deletes the document with this id, if any.
    async fn delete_one(&self, id: Bson) -> DaoResult<()>;

    /// Counts documents with this id.
    async fn count(&self, id: Bson) -> DaoResult<u64>;

    /// Returns the document with this id.
    async fn find_one(&self, id: Bson) -> DaoResult<Option<Document>>;

    /// Returns every document in natural order.
    async fn find_all(&self) -> DaoResult<Vec<Document>>;
}

/// Picks the existing collection that stores `wanted`.
///
/// An exact match wins; otherwise the first case-insensitive match.
pub fn resolve_collection_name<'a>(existing: &'a [String], wanted: &str) -> Option<&'a str> {
    existing
        .iter()
        .find(|name| *name == wanted)
        .or_else(|| existing.iter().find(|name| name.eq_ignore_ascii_case(wanted)))
        .map(String::as_str)
}

/// MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoCollection {
    inner: Collection<Document>,
}

impl MongoCollection {
    /// Opens the collection for `wanted`, creating it when no existing
    /// collection matches case-insensitively.
    pub async fn open(database: &Database, wanted: &str) -> DaoResult<Self> {
        let existing = database.list_collection_names().await?;

        let name = match resolve_collection_name(&existing, wanted) {
            Some(name) => name.to_string(),
            None => {
                database.create_collection(wanted).await?;
                info!(collection = wanted, "Collection created");
                wanted.to_string()
            }
        };

        Ok(Self {
            inner: database.collection(&name),
        })
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    async fn replace_one(&self, id: Bson, document: Document) -> DaoResult<()> {
        self.inner
            .replace_one(doc! { "_id": id }, document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete_one(&self, id: Bson) -> DaoResult<()> {
        self.inner.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }

    async fn count(&self, id: Bson) -> DaoResult<u64> {
        Ok(self.inner.count_documents(doc! { "_id": id }).await?)
    }

    async fn find_one(&self, id: Bson) -> DaoResult<Option<Document>> {
        Ok(self.inner.find_one(doc! { "_id": id }).await?)
    }

    async fn find_all(&self) -> DaoResult<Vec<Document>> {
        let cursor = self.inner.find(doc! {}).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }
}
