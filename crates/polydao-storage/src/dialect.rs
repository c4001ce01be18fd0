//! SQL dialects and the statements rendered from an entity descriptor.

use polydao_config::Driver;
use polydao_core::{EntityDescriptor, FieldDescriptor, FieldType};

/// SQL flavour spoken by a relational driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `$n` placeholders, double-quoted identifiers.
    Postgres,
    /// `?` placeholders, backtick-quoted identifiers.
    MySql,
    /// `?` placeholders, double-quoted identifiers.
    Sqlite,
}

impl Dialect {
    /// Returns the dialect of a relational driver, `None` for document drivers.
    #[must_use]
    pub const fn for_driver(driver: Driver) -> Option<Self> {
        match driver {
            Driver::PostgreSql => Some(Self::Postgres),
            Driver::MySql => Some(Self::MySql),
            Driver::Sqlite => Some(Self::Sqlite),
            Driver::MongoDb => None,
        }
    }

    /// Quotes an identifier.
    #[must_use]
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{ident}`"),
            Self::Postgres | Self::Sqlite => format!("\"{ident}\""),
        }
    }

    /// Renders the 1-based positional placeholder.
    #[must_use]
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Self::Postgres => format!("${position}"),
            Self::MySql | Self::Sqlite => "?".to_string(),
        }
    }

    /// Returns the column type for a field.
    ///
    /// MySQL cannot index unbounded TEXT/BLOB columns, so keys get bounded types.
    #[must_use]
    pub const fn column_type(self, field_type: FieldType, key: bool) -> &'static str {
        match (self, field_type) {
            (_, FieldType::Bool) => "BOOLEAN",
            (Self::Sqlite, FieldType::Integer) => "INTEGER",
            (_, FieldType::Integer) => "BIGINT",
            (Self::Postgres, FieldType::Float) => "DOUBLE PRECISION",
            (Self::MySql, FieldType::Float) => "DOUBLE",
            (Self::Sqlite, FieldType::Float) => "REAL",
            (Self::MySql, FieldType::Text) if key => "VARCHAR(255)",
            (Self::MySql, FieldType::Structured) => "LONGTEXT",
            (_, FieldType::Text | FieldType::Structured) => "TEXT",
            (Self::Postgres, FieldType::Bytes) => "BYTEA",
            (Self::MySql, FieldType::Bytes) if key => "VARBINARY(255)",
            (Self::MySql | Self::Sqlite, FieldType::Bytes) => "BLOB",
        }
    }

    fn column_list(self, fields: &[FieldDescriptor]) -> String {
        fields
            .iter()
            .map(|field| self.quote(field.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Statements of one entity, rendered once for a dialect.
///
/// Every statement lists columns in descriptor field order. The upsert binds
/// all fields in that order; the keyed statements bind only the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    pub upsert: String,
    pub delete: String,
    pub count: String,
    pub select_one: String,
    pub select_all: String,
    pub create_table: String,
}

impl Statements {
    /// Renders every statement of an entity.
    #[must_use]
    pub fn render(dialect: Dialect, descriptor: &EntityDescriptor) -> Self {
        let table = dialect.quote(descriptor.name());
        let key = dialect.quote(descriptor.key_field().name());
        let columns = dialect.column_list(descriptor.fields());
        let by_key = format!("WHERE {key} = {}", dialect.placeholder(1));

        Self {
            upsert: render_upsert(dialect, descriptor, &table, &key, &columns),
            delete: format!("DELETE FROM {table} {by_key}"),
            count: format!("SELECT COUNT(*) FROM {table} {by_key}"),
            select_one: format!("SELECT {columns} FROM {table} {by_key}"),
            select_all: format!("SELECT {columns} FROM {table}"),
            create_table: render_create_table(dialect, descriptor, &table),
        }
    }
}

fn render_upsert(
    dialect: Dialect,
    descriptor: &EntityDescriptor,
    table: &str,
    key: &str,
    columns: &str,
) -> String {
    let placeholders = (1..=descriptor.fields().len())
        .map(|position| dialect.placeholder(position))
        .collect::<Vec<_>>()
        .join(", ");
    let insert = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})");

    let updated: Vec<String> = descriptor
        .value_fields()
        .map(|field| dialect.quote(field.name()))
        .collect();

    match dialect {
        Dialect::MySql if updated.is_empty() => {
            format!("{insert} ON DUPLICATE KEY UPDATE {key} = {key}")
        }
        Dialect::MySql => {
            let assignments = updated
                .iter()
                .map(|column| format!("{column} = VALUES({column})"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{insert} ON DUPLICATE KEY UPDATE {assignments}")
        }
        Dialect::Postgres | Dialect::Sqlite if updated.is_empty() => {
            format!("{insert} ON CONFLICT ({key}) DO NOTHING")
        }
        Dialect::Postgres | Dialect::Sqlite => {
            let assignments = updated
                .iter()
                .map(|column| format!("{column} = excluded.{column}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{insert} ON CONFLICT ({key}) DO UPDATE SET {assignments}")
        }
    }
}

fn render_create_table(dialect: Dialect, descriptor: &EntityDescriptor, table: &str) -> String {
    let definitions = descriptor
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let key = index == descriptor.key_index();
            let column = format!(
                "{} {}",
                dialect.quote(field.name()),
                dialect.column_type(field.field_type(), key)
            );
            if key {
                format!("{column} NOT NULL PRIMARY KEY")
            } else {
                column
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE IF NOT EXISTS {table} ({definitions})")
}
