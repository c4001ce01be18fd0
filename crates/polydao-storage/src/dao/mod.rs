//! DAO engines implementing [`Dao`](polydao_core::Dao).

mod collection;
mod document_dao;
mod sql_dao;

pub use collection::{resolve_collection_name, DocumentCollection, MongoCollection};
pub use document_dao::DocumentDao;
pub use sql_dao::SqlDao;
