//! Cached metadata describing an entity type.

use super::{Entity, Record};
use crate::codec::{CodecError, FieldType, ToValue, Value};
use crate::{DaoError, DaoResult};

/// One persisted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
}

impl FieldDescriptor {
    pub(crate) fn new(name: String, field_type: FieldType) -> Self {
        Self { name, field_type }
    }

    /// Returns the field (column / document field) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// Validated, immutable shape of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    key_index: usize,
}

impl EntityDescriptor {
    pub(crate) fn new(name: String, fields: Vec<FieldDescriptor>, key_index: usize) -> Self {
        Self {
            name,
            fields,
            key_index,
        }
    }

    /// Returns the logical table/collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the persisted fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the key field.
    #[must_use]
    pub fn key_field(&self) -> &FieldDescriptor {
        &self.fields[self.key_index]
    }

    /// Returns the position of the key field within [`fields`](Self::fields).
    #[must_use]
    pub const fn key_index(&self) -> usize {
        self.key_index
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Iterates over the non-key fields in declaration order.
    pub fn value_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .enumerate()
            .filter(move |(index, _)| *index != self.key_index)
            .map(|(_, field)| field)
    }

    /// Extracts the persisted values of a record in field order.
    ///
    /// Every declared field must be present and conform to its declared type;
    /// undeclared record entries are ignored.
    pub fn project(&self, record: &Record) -> DaoResult<Vec<Value>> {
        self.fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let value = record.get(&field.name).ok_or_else(|| {
                    DaoError::codec(&field.name, CodecError::new("entity did not write this field"))
                })?;
                check(field, value, index == self.key_index)?;
                Ok(value.clone())
            })
            .collect()
    }

    /// Returns the key value an entity wrote into its record.
    pub fn key_value(&self, record: &Record) -> DaoResult<Value> {
        let field = self.key_field();
        let value = record.get(&field.name).ok_or_else(|| {
            DaoError::codec(&field.name, CodecError::new("entity did not write its key"))
        })?;
        check(field, value, true)?;
        Ok(value.clone())
    }

    /// Encodes an entity key for lookups.
    pub fn encode_key<K: ToValue + ?Sized>(&self, key: &K) -> DaoResult<Value> {
        let field = self.key_field();
        let value = key
            .to_value()
            .map_err(|source| DaoError::codec(&field.name, source))?;
        check(field, &value, true)?;
        Ok(value)
    }

    /// Materializes an entity from values given in field order.
    pub fn hydrate<E: Entity>(&self, values: Vec<Value>) -> DaoResult<E> {
        if values.len() != self.fields.len() {
            return Err(DaoError::codec(
                &self.name,
                CodecError::new(format!(
                    "expected {} stored values, found {}",
                    self.fields.len(),
                    values.len()
                )),
            ));
        }

        let record: Record = self
            .fields
            .iter()
            .map(|field| field.name.clone())
            .zip(values)
            .collect();
        E::from_record(record)
    }
}

fn check(field: &FieldDescriptor, value: &Value, is_key: bool) -> DaoResult<()> {
    if is_key && value.is_null() {
        return Err(DaoError::codec(
            &field.name,
            CodecError::new("key value must not be null"),
        ));
    }
    if !value.conforms_to(field.field_type) {
        return Err(DaoError::codec(
            &field.name,
            CodecError::mismatch(field.field_type.as_str(), value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::Schema;
    use super::*;

    fn descriptor() -> EntityDescriptor {
        Schema::new()
            .field("name", FieldType::Text)
            .key("id", FieldType::Text)
            .field("age", FieldType::Integer)
            .build("user")
            .unwrap()
    }

    #[test]
    fn test_key_and_value_fields() {
        let descriptor = descriptor();
        assert_eq!(descriptor.key_index(), 1);
        assert_eq!(descriptor.key_field().name(), "id");

        let names: Vec<&str> = descriptor.value_fields().map(FieldDescriptor::name).collect();
        assert_eq!(names, vec!["name", "age"]);
        assert_eq!(descriptor.field("age").unwrap().field_type(), FieldType::Integer);
        assert!(descriptor.field("email").is_none());
    }

    #[test]
    fn test_project_orders_values_and_skips_transient() {
        let record = Record::new()
            .with("id", "u1")
            .unwrap()
            .with("age", 30_i64)
            .unwrap()
            .with("name", "Ann")
            .unwrap()
            .with("session", "transient")
            .unwrap();

        let values = descriptor().project(&record).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Text("Ann".into()),
                Value::Text("u1".into()),
                Value::Int(30)
            ]
        );
    }

    #[test]
    fn test_project_rejects_missing_and_mismatched_fields() {
        let missing = Record::new().with("id", "u1").unwrap();
        let err = descriptor().project(&missing).unwrap_err();
        assert!(matches!(err, DaoError::Codec { ref field, .. } if field == "name"));

        let mismatched = Record::new()
            .with("id", "u1")
            .unwrap()
            .with("name", "Ann")
            .unwrap()
            .with("age", "thirty")
            .unwrap();
        let err = descriptor().project(&mismatched).unwrap_err();
        assert!(matches!(err, DaoError::Codec { ref field, .. } if field == "age"));
    }

    #[test]
    fn test_null_key_rejected() {
        let err = descriptor().encode_key(&Option::<String>::None).unwrap_err();
        assert!(err.to_string().contains("key value must not be null"));

        let err = descriptor().encode_key(&5_i64).unwrap_err();
        assert!(err.to_string().contains("expected text, found integer"));

        assert_eq!(descriptor().encode_key("u1").unwrap(), Value::Text("u1".into()));
    }

    #[test]
    fn test_key_value_reads_record() {
        let record = Record::new().with("id", "u9").unwrap();
        assert_eq!(
            descriptor().key_value(&record).unwrap(),
            Value::Text("u9".into())
        );

        let err = descriptor().key_value(&Record::new()).unwrap_err();
        assert!(err.to_string().contains("entity did not write its key"));
    }
}
