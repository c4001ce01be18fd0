//! Binding and decoding of values through the runtime-selected SQL driver.

use polydao_core::{CodecError, DaoError, DaoResult, FieldDescriptor, FieldType, Value};
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, Decode, Row, Type};

/// A statement over the `Any` driver.
pub type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Binds a value as the next positional parameter.
///
/// `Null` is bound with the SQL type of the declared field so drivers with
/// typed parameters accept it.
pub fn bind_value(query: AnyQuery<'_>, value: Value, field_type: FieldType) -> AnyQuery<'_> {
    match value {
        Value::Null => match field_type {
            FieldType::Bool => query.bind(None::<bool>),
            FieldType::Integer => query.bind(None::<i64>),
            FieldType::Float => query.bind(None::<f64>),
            FieldType::Text | FieldType::Structured => query.bind(None::<String>),
            FieldType::Bytes => query.bind(None::<Vec<u8>>),
        },
        Value::Bool(value) => query.bind(value),
        Value::Int(value) => query.bind(value),
        Value::Float(value) => query.bind(value),
        Value::Text(value) | Value::Structured(value) => query.bind(value),
        Value::Bytes(value) => query.bind(value),
    }
}

/// Reads a column into the declared type of its field.
///
/// Decoding is lenient where drivers disagree on representation: integer
/// columns are accepted for booleans (`TINYINT(1)`), single precision and
/// integers for floats, and UTF-8 blobs for text.
pub fn decode_column(row: &AnyRow, index: usize, field: &FieldDescriptor) -> DaoResult<Value> {
    let decoded = match field.field_type() {
        FieldType::Bool => column::<bool>(row, index)
            .map(|value| value.map(Value::Bool))
            .or_else(|_| column::<i64>(row, index).map(|value| value.map(|n| Value::Bool(n != 0)))),
        FieldType::Integer => column::<i64>(row, index).map(|value| value.map(Value::Int)),
        FieldType::Float => column::<f64>(row, index)
            .or_else(|_| column::<f32>(row, index).map(|value| value.map(f64::from)))
            .or_else(|_| column::<i64>(row, index).map(|value| value.map(|n| n as f64)))
            .map(|value| value.map(Value::Float)),
        FieldType::Text => text(row, index).map(|value| value.map(Value::Text)),
        FieldType::Structured => text(row, index).map(|value| value.map(Value::Structured)),
        FieldType::Bytes => column::<Vec<u8>>(row, index).map(|value| value.map(Value::Bytes)),
    };

    decoded
        .map(|value| value.unwrap_or(Value::Null))
        .map_err(|e| {
            DaoError::codec(
                field.name(),
                CodecError::new(format!(
                    "column {index} is not readable as {}: {e}",
                    field.field_type()
                )),
            )
        })
}

fn column<'r, T>(row: &'r AnyRow, index: usize) -> Result<Option<T>, sqlx::Error>
where
    T: Decode<'r, Any> + Type<Any>,
{
    row.try_get_unchecked::<Option<T>, _>(index)
}

fn text(row: &AnyRow, index: usize) -> Result<Option<String>, sqlx::Error> {
    column::<String>(row, index).or_else(|_| {
        column::<Vec<u8>>(row, index)?
            .map(String::from_utf8)
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))
    })
}
