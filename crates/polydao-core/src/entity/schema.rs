//! Static declaration of an entity's persisted shape.

use super::descriptor::{EntityDescriptor, FieldDescriptor};
use crate::codec::FieldType;
use crate::{DaoError, DaoResult};
use std::collections::HashSet;

/// Field name reserved for the document identity.
pub(crate) const DOCUMENT_ID: &str = "_id";

#[derive(Debug, Clone)]
struct FieldDecl {
    name: String,
    field_type: FieldType,
    key: bool,
}

/// Declaration of an entity's name, key and persisted fields.
///
/// Fields are persisted in declaration order. Anything the schema does not
/// declare is transient.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: Option<String>,
    fields: Vec<FieldDecl>,
}

impl Schema {
    /// Creates an empty declaration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the table/collection name derived from the type name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares the key field.
    #[must_use]
    pub fn key(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            field_type,
            key: true,
        });
        self
    }

    /// Declares a persisted non-key field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            field_type,
            key: false,
        });
        self
    }

    /// Validates the declaration into a descriptor.
    pub(crate) fn build(self, default_name: &str) -> DaoResult<EntityDescriptor> {
        let name = self.name.unwrap_or_else(|| default_name.to_string());
        if !is_identifier(&name) {
            return Err(DaoError::invalid_entity(
                &name,
                "entity name must be a plain identifier",
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name == DOCUMENT_ID {
                return Err(DaoError::invalid_entity(
                    &name,
                    format!("field name `{DOCUMENT_ID}` is reserved"),
                ));
            }
            if !is_identifier(&field.name) {
                return Err(DaoError::invalid_entity(
                    &name,
                    format!("field name `{}` is not a plain identifier", field.name),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(DaoError::invalid_entity(
                    &name,
                    format!("field `{}` is declared twice", field.name),
                ));
            }
        }

        let keys: Vec<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.key)
            .map(|(index, _)| index)
            .collect();

        let key_index = match keys.as_slice() {
            [] => return Err(DaoError::invalid_entity(&name, "no key field declared")),
            [index] => *index,
            _ => {
                return Err(DaoError::invalid_entity(
                    &name,
                    format!("{} key fields declared, expected exactly one", keys.len()),
                ))
            }
        };

        let key = &self.fields[key_index];
        if !key.field_type.can_be_key() {
            return Err(DaoError::invalid_entity(
                &name,
                format!(
                    "key field `{}` has type {}, which cannot identify an entity",
                    key.name, key.field_type
                ),
            ));
        }

        let fields = self
            .fields
            .into_iter()
            .map(|field| FieldDescriptor::new(field.name, field.field_type))
            .collect();

        Ok(EntityDescriptor::new(name, fields, key_index))
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
