//! Common test infrastructure for storage integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bson::{Bson, Document};
use parking_lot::Mutex;
use polydao_config::StorageConfig;
use polydao_core::{DaoResult, Entity, FieldType, Json, Record, Schema};
use polydao_storage::{DocumentCollection, DocumentDao, SqlDao, Storage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempfile::TempDir;

/// Minimal entity: text key, one scalar, one structured field.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
}

impl User {
    pub fn new(id: &str, name: &str, tags: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
        }
    }
}

impl Entity for User {
    type Key = String;

    fn schema() -> Schema {
        Schema::new()
            .key("id", FieldType::Text)
            .field("name", FieldType::Text)
            .field("tags", FieldType::Structured)
    }

    fn to_record(&self) -> DaoResult<Record> {
        Record::new()
            .with("id", &self.id)?
            .with("name", &self.name)?
            .with("tags", Json(&self.tags))
    }

    fn from_record(mut record: Record) -> DaoResult<Self> {
        Ok(Self {
            id: record.take("id")?,
            name: record.take("name")?,
            tags: record.take::<Json<Vec<String>>>("tags")?.into_inner(),
        })
    }
}

/// Nested value stored in a structured field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: Option<u32>,
}

/// Entity exercising every field type.
///
/// `hits` is unsigned: values above `i64::MAX` fail to encode, which the
/// batch tests use to inject a codec failure mid-batch. `session` is
/// transient.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub active: bool,
    pub balance: f64,
    pub avatar: Option<Vec<u8>>,
    pub address: Address,
    pub hits: u64,
    pub nickname: Option<String>,
    pub session: Option<String>,
}

impl Account {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            email: format!("user{id}@example.com"),
            active: id % 2 == 0,
            balance: id as f64 * 10.5,
            avatar: Some(vec![0xde, 0xad, id as u8]),
            address: Address {
                street: format!("{id} Main St"),
                city: "Springfield".to_string(),
                zip: Some(12345),
            },
            hits: 3,
            nickname: None,
            session: None,
        }
    }
}

impl Entity for Account {
    type Key = i64;

    fn schema() -> Schema {
        Schema::new()
            .named("accounts")
            .key("id", FieldType::Integer)
            .field("email", FieldType::Text)
            .field("active", FieldType::Bool)
            .field("balance", FieldType::Float)
            .field("avatar", FieldType::Bytes)
            .field("address", FieldType::Structured)
            .field("hits", FieldType::Integer)
            .field("nickname", FieldType::Text)
    }

    fn to_record(&self) -> DaoResult<Record> {
        Record::new()
            .with("id", self.id)?
            .with("email", &self.email)?
            .with("active", self.active)?
            .with("balance", self.balance)?
            .with("avatar", &self.avatar)?
            .with("address", Json(&self.address))?
            .with("hits", self.hits)?
            .with("nickname", &self.nickname)
    }

    fn from_record(mut record: Record) -> DaoResult<Self> {
        Ok(Self {
            id: record.take("id")?,
            email: record.take("email")?,
            active: record.take("active")?,
            balance: record.take("balance")?,
            avatar: record.take("avatar")?,
            address: record.take::<Json<Address>>("address")?.into_inner(),
            hits: record.take("hits")?,
            nickname: record.take("nickname")?,
            session: None,
        })
    }
}

/// Coordinates stored as an optional structured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub lat: f64,
    pub lon: f64,
}

/// Entity whose structured fields hold a nullable value and unsigned
/// integers beyond the signed 64-bit range.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: String,
    pub geo: Option<Geo>,
    pub counters: Vec<u64>,
}

impl Entity for Place {
    type Key = String;

    fn schema() -> Schema {
        Schema::new()
            .key("id", FieldType::Text)
            .field("geo", FieldType::Structured)
            .field("counters", FieldType::Structured)
    }

    fn to_record(&self) -> DaoResult<Record> {
        Record::new()
            .with("id", &self.id)?
            .with("geo", Json(&self.geo))?
            .with("counters", Json(&self.counters))
    }

    fn from_record(mut record: Record) -> DaoResult<Self> {
        Ok(Self {
            id: record.take("id")?,
            geo: record.take::<Json<Option<Geo>>>("geo")?.into_inner(),
            counters: record.take::<Json<Vec<u64>>>("counters")?.into_inner(),
        })
    }
}

/// SQLite database in a temporary directory.
pub struct TestSqlite {
    _dir: TempDir,
    config: StorageConfig,
    storage: Storage,
}

impl TestSqlite {
    /// Starts a fresh database file.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = StorageConfig {
            driver: "sqlite".to_string(),
            database: dir.path().join("test.db").display().to_string(),
            ..StorageConfig::default()
        };
        let storage = polydao_storage::start(&config)
            .await
            .expect("Failed to start SQLite storage");

        Self {
            _dir: dir,
            config,
            storage,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Returns a DAO whose table exists.
    pub async fn dao<E: Entity>(&self) -> SqlDao<E> {
        self.storage
            .sql_dao::<E>()
            .await
            .expect("Failed to prepare table")
    }
}

/// Document collection held in memory, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCollection {
    documents: Arc<Mutex<Vec<Document>>>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored document.
    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().clone()
    }

    fn position(documents: &[Document], id: &Bson) -> Option<usize> {
        documents
            .iter()
            .position(|document| document.get("_id") == Some(id))
    }
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    async fn replace_one(&self, id: Bson, document: Document) -> DaoResult<()> {
        let mut documents = self.documents.lock();
        match Self::position(&documents, &id) {
            Some(index) => documents[index] = document,
            None => documents.push(document),
        }
        Ok(())
    }

    async fn delete_one(&self, id: Bson) -> DaoResult<()> {
        let mut documents = self.documents.lock();
        if let Some(index) = Self::position(&documents, &id) {
            documents.remove(index);
        }
        Ok(())
    }

    async fn count(&self, id: Bson) -> DaoResult<u64> {
        let documents = self.documents.lock();
        Ok(u64::from(Self::position(&documents, &id).is_some()))
    }

    async fn find_one(&self, id: Bson) -> DaoResult<Option<Document>> {
        let documents = self.documents.lock();
        Ok(Self::position(&documents, &id).map(|index| documents[index].clone()))
    }

    async fn find_all(&self) -> DaoResult<Vec<Document>> {
        Ok(self.documents.lock().clone())
    }
}

/// Document DAO over a fresh in-memory collection.
pub fn memory_dao<E: Entity>() -> (DocumentDao<E, InMemoryCollection>, InMemoryCollection) {
    let collection = InMemoryCollection::new();
    let dao = DocumentDao::with_collection(collection.clone()).expect("Invalid entity");
    (dao, collection)
}
