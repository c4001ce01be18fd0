//! BSON representation of values.

use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Decimal128, Document};
use polydao_core::{CodecError, DaoError, DaoResult, FieldDescriptor, FieldType, Value};
use serde_json::{Map, Number, Value as JsonValue};

/// Exponent bias of the IEEE 754 decimal128 interchange format.
const DECIMAL128_BIAS: u128 = 6176;
const DECIMAL128_COEFFICIENT_BITS: u32 = 113;

/// Encodes a value for storage in a document.
///
/// Structured values become embedded BSON (sub-documents, arrays or scalars)
/// so they stay queryable inside the store. Integers above `i64::MAX` are
/// stored as exact `Decimal128` values.
pub fn to_bson(value: Value, field: &FieldDescriptor) -> DaoResult<Bson> {
    Ok(match value {
        Value::Null => Bson::Null,
        Value::Bool(value) => Bson::Boolean(value),
        Value::Int(value) => Bson::Int64(value),
        Value::Float(value) => Bson::Double(value),
        Value::Text(value) => Bson::String(value),
        Value::Bytes(bytes) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        }),
        Value::Structured(text) => {
            let json: JsonValue = serde_json::from_str(&text).map_err(|e| {
                DaoError::codec(field.name(), CodecError::new(format!("invalid structured text: {e}")))
            })?;
            json_to_bson(json)
        }
    })
}

/// Decodes a stored BSON value into the declared type of its field.
///
/// Numeric widths are accepted interchangeably where no precision is lost.
/// Any BSON is accepted for structured fields and handed back as relaxed
/// extended JSON text.
pub fn from_bson(bson: Bson, field: &FieldDescriptor) -> DaoResult<Value> {
    let mismatch = |found: &Bson| {
        DaoError::codec(
            field.name(),
            CodecError::new(format!(
                "expected {}, found BSON {:?}",
                field.field_type(),
                found.element_type()
            )),
        )
    };

    match (field.field_type(), bson) {
        (_, Bson::Null | Bson::Undefined) => Ok(Value::Null),
        (FieldType::Bool, Bson::Boolean(value)) => Ok(Value::Bool(value)),
        (FieldType::Bool, Bson::Int32(value)) => Ok(Value::Bool(value != 0)),
        (FieldType::Bool, Bson::Int64(value)) => Ok(Value::Bool(value != 0)),
        (FieldType::Integer, Bson::Int64(value)) => Ok(Value::Int(value)),
        (FieldType::Integer, Bson::Int32(value)) => Ok(Value::Int(i64::from(value))),
        (FieldType::Float, Bson::Double(value)) => Ok(Value::Float(value)),
        (FieldType::Float, Bson::Int32(value)) => Ok(Value::Float(f64::from(value))),
        (FieldType::Float, Bson::Int64(value)) => Ok(Value::Float(value as f64)),
        (FieldType::Text, Bson::String(value)) => Ok(Value::Text(value)),
        (FieldType::Text, Bson::ObjectId(id)) => Ok(Value::Text(id.to_hex())),
        (FieldType::Bytes, Bson::Binary(binary)) => Ok(Value::Bytes(binary.bytes)),
        (FieldType::Structured, other) => serde_json::to_string(&bson_to_json(other))
            .map(Value::Structured)
            .map_err(|e| DaoError::codec(field.name(), CodecError::new(e.to_string()))),
        (_, other) => Err(mismatch(&other)),
    }
}

fn json_to_bson(json: JsonValue) -> Bson {
    match json {
        JsonValue::Null => Bson::Null,
        JsonValue::Bool(value) => Bson::Boolean(value),
        JsonValue::Number(number) => {
            if let Some(value) = number.as_i64() {
                Bson::Int64(value)
            } else if let Some(value) = number.as_u64() {
                Bson::Decimal128(decimal_from_u64(value))
            } else {
                number.as_f64().map_or(Bson::Null, Bson::Double)
            }
        }
        JsonValue::String(value) => Bson::String(value),
        JsonValue::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        JsonValue::Object(entries) => Bson::Document(
            entries
                .into_iter()
                .map(|(key, value)| (key, json_to_bson(value)))
                .collect::<Document>(),
        ),
    }
}

/// Converts embedded BSON back to JSON.
///
/// Types JSON has no literal for (object ids, dates, binaries, non-integral
/// decimals, non-finite doubles) fall back to relaxed extended JSON.
fn bson_to_json(bson: Bson) -> JsonValue {
    match bson {
        Bson::Null | Bson::Undefined => JsonValue::Null,
        Bson::Boolean(value) => JsonValue::Bool(value),
        Bson::Int32(value) => JsonValue::from(value),
        Bson::Int64(value) => JsonValue::from(value),
        Bson::Double(value) => Number::from_f64(value)
            .map_or_else(|| Bson::Double(value).into_relaxed_extjson(), JsonValue::Number),
        Bson::Decimal128(decimal) => decimal_to_u64(&decimal).map_or_else(
            || Bson::Decimal128(decimal).into_relaxed_extjson(),
            JsonValue::from,
        ),
        Bson::String(value) => JsonValue::String(value),
        Bson::Array(items) => JsonValue::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(document) => JsonValue::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect::<Map<_, _>>(),
        ),
        other => other.into_relaxed_extjson(),
    }
}

/// Encodes an unsigned integer as a decimal128 with exponent zero.
fn decimal_from_u64(value: u64) -> Decimal128 {
    let bits = (DECIMAL128_BIAS << DECIMAL128_COEFFICIENT_BITS) | u128::from(value);
    Decimal128::from_bytes(bits.to_le_bytes())
}

/// Decodes a decimal128 written by [`decimal_from_u64`].
fn decimal_to_u64(decimal: &Decimal128) -> Option<u64> {
    let bits = u128::from_le_bytes(decimal.bytes());
    let coefficient_mask = (1_u128 << DECIMAL128_COEFFICIENT_BITS) - 1;
    if bits >> DECIMAL128_COEFFICIENT_BITS != DECIMAL128_BIAS {
        return None;
    }
    u64::try_from(bits & coefficient_mask).ok()
}
