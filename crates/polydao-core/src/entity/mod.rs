//! Entity declarations and their cached descriptors.
//!
//! An entity declares its persisted shape once through [`Entity::schema`].
//! The shape is validated and cached the first time [`describe`] sees the
//! type; every DAO works from that cached [`EntityDescriptor`].

mod descriptor;
mod registry;
mod schema;

pub use descriptor::{EntityDescriptor, FieldDescriptor};
pub use registry::describe;
pub use schema::Schema;

use crate::codec::{FromValue, ToValue, Value};
use crate::{DaoError, DaoResult};
use std::collections::HashMap;

/// An application-defined record persisted as one row or one document.
///
/// # Example
///
/// ```
/// use polydao_core::{DaoResult, Entity, FieldType, Json, Record, Schema};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct User {
///     id: String,
///     name: String,
///     tags: Vec<String>,
/// }
///
/// impl Entity for User {
///     type Key = String;
///
///     fn schema() -> Schema {
///         Schema::new()
///             .key("id", FieldType::Text)
///             .field("name", FieldType::Text)
///             .field("tags", FieldType::Structured)
///     }
///
///     fn to_record(&self) -> DaoResult<Record> {
///         Record::new()
///             .with("id", &self.id)?
///             .with("name", &self.name)?
///             .with("tags", Json(&self.tags))
///     }
///
///     fn from_record(mut record: Record) -> DaoResult<Self> {
///         Ok(Self {
///             id: record.take("id")?,
///             name: record.take("name")?,
///             tags: record.take::<Json<Vec<String>>>("tags")?.into_inner(),
///         })
///     }
/// }
///
/// let descriptor = polydao_core::describe::<User>().unwrap();
/// assert_eq!(descriptor.name(), "user");
/// assert_eq!(descriptor.key_field().name(), "id");
/// ```
pub trait Entity: Sized + Send + Sync + 'static {
    /// Rust type of the key field, used by `contains` and `find`.
    type Key: ToValue + Send + Sync;

    /// Declares the persisted shape of the entity.
    fn schema() -> Schema;

    /// Writes the persisted field values of this instance.
    fn to_record(&self) -> DaoResult<Record>;

    /// Materializes an instance from stored field values.
    fn from_record(record: Record) -> DaoResult<Self>;
}

/// Field values of one entity instance, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes and stores a field value.
    pub fn put<V: ToValue>(&mut self, field: &str, value: V) -> DaoResult<&mut Self> {
        let value = value
            .to_value()
            .map_err(|source| DaoError::codec(field, source))?;
        self.insert_value(field, value);
        Ok(self)
    }

    /// Builder form of [`put`](Self::put).
    pub fn with<V: ToValue>(mut self, field: &str, value: V) -> DaoResult<Self> {
        self.put(field, value)?;
        Ok(self)
    }

    /// Stores an already-encoded value.
    pub fn insert_value(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Removes a field and decodes it. Absent fields decode from null.
    pub fn take<T: FromValue>(&mut self, field: &str) -> DaoResult<T> {
        let value = self.values.remove(field).unwrap_or(Value::Null);
        T::from_value(value).map_err(|source| DaoError::codec(field, source))
    }

    /// Returns the number of fields present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
