//! Backend-neutral field values and the scalar codecs.

use chrono::{DateTime, Utc};
use std::fmt::{self, Display};
use thiserror::Error;
use uuid::Uuid;

/// Declared type of a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Boolean flag.
    Bool,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
    /// Nested value carried through the structured-text codec.
    Structured,
}

impl FieldType {
    /// Returns true if a field of this type may serve as the entity key.
    #[must_use]
    pub const fn can_be_key(self) -> bool {
        matches!(self, Self::Integer | Self::Text | Self::Bytes)
    }

    /// Returns the lower-case type name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Structured => "structured",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value in its backend-neutral form.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Canonical structured text (JSON) of a nested value.
    Structured(String),
}

impl Value {
    /// Returns the field type this value naturally belongs to, `None` for null.
    #[must_use]
    pub const fn field_type(&self) -> Option<FieldType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(FieldType::Bool),
            Self::Int(_) => Some(FieldType::Integer),
            Self::Float(_) => Some(FieldType::Float),
            Self::Text(_) => Some(FieldType::Text),
            Self::Bytes(_) => Some(FieldType::Bytes),
            Self::Structured(_) => Some(FieldType::Structured),
        }
    }

    /// Returns true if the value may be stored in a field of the given type.
    #[must_use]
    pub fn conforms_to(&self, field_type: FieldType) -> bool {
        self.field_type().map_or(true, |own| own == field_type)
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn kind(&self) -> &'static str {
        self.field_type().map_or("null", FieldType::as_str)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) | Self::Structured(s) => f.write_str(s),
            Self::Bytes(bytes) => {
                f.write_str("0x")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// A value could not be represented in, or reconstructed from, its stored form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CodecError {
    message: String,
}

impl CodecError {
    /// Creates a codec error with a message.
    #[must_use]
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn mismatch(expected: &str, found: &Value) -> Self {
        Self::new(format!("expected {expected}, found {}", found.kind()))
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Converts a Rust value into a [`Value`].
pub trait ToValue {
    /// Encodes `self` into its backend-neutral form.
    fn to_value(&self) -> Result<Value, CodecError>;
}

/// Reconstructs a Rust value from a [`Value`].
pub trait FromValue: Sized {
    /// Decodes the value, failing on a type mismatch.
    fn from_value(value: Value) -> Result<Self, CodecError>;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value, CodecError> {
        (**self).to_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(self.clone())
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        Ok(value)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Bool(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(CodecError::mismatch("bool", &other)),
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Result<Value, CodecError> {
                    i64::try_from(*self).map(Value::Int).map_err(|_| {
                        CodecError::new(format!(
                            "{} does not fit in a signed 64-bit integer",
                            self
                        ))
                    })
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| {
                            CodecError::new(format!(
                                "{} is out of range for {}",
                                i,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(CodecError::mismatch("integer", &other)),
                    }
                }
            }
        )*
    };
}

impl_integer!(i16, i32, i64, u32, u64);

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Float(*self))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(CodecError::mismatch("float", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self, CodecError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Text(self.to_owned()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Text(self.clone()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(CodecError::mismatch("text", &other)),
        }
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Bytes(self.clone()))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(CodecError::mismatch("bytes", &other)),
        }
    }
}

impl ToValue for Uuid {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Text(self.to_string()))
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        let text = String::from_value(value)?;
        Uuid::parse_str(&text).map_err(|e| CodecError::new(format!("invalid UUID `{text}`: {e}")))
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Text(self.to_rfc3339()))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        let text = String::from_value(value)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CodecError::new(format!("invalid timestamp `{text}`: {e}")))
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, CodecError> {
        match self {
            Some(inner) => inner.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conformance() {
        assert!(Value::Null.conforms_to(FieldType::Integer));
        assert!(Value::Int(3).conforms_to(FieldType::Integer));
        assert!(!Value::Int(3).conforms_to(FieldType::Float));
        assert!(!Value::Text("a".into()).conforms_to(FieldType::Structured));
        assert!(Value::Structured("[]".into()).conforms_to(FieldType::Structured));
    }

    #[test]
    fn test_key_capable_types() {
        assert!(FieldType::Text.can_be_key());
        assert!(FieldType::Integer.can_be_key());
        assert!(FieldType::Bytes.can_be_key());
        assert!(!FieldType::Structured.can_be_key());
        assert!(!FieldType::Float.can_be_key());
        assert!(!FieldType::Bool.can_be_key());
    }

    #[test]
    fn test_integer_range_checks() {
        assert_eq!(i32::from_value(Value::Int(42)).unwrap(), 42);
        assert!(i16::from_value(Value::Int(i64::from(i16::MAX) + 1)).is_err());
        assert!(u32::from_value(Value::Int(-1)).is_err());

        assert_eq!(u64::MAX.to_value().unwrap_err().message(), format!("{} does not fit in a signed 64-bit integer", u64::MAX));
        assert_eq!(7_u64.to_value().unwrap(), Value::Int(7));
    }

    #[test]
    fn test_type_mismatch() {
        let err = String::from_value(Value::Int(1)).unwrap_err();
        assert_eq!(err.message(), "expected text, found integer");

        let err = bool::from_value(Value::Null).unwrap_err();
        assert_eq!(err.message(), "expected bool, found null");
    }

    #[test]
    fn test_option_maps_null() {
        assert_eq!(Option::<String>::None.to_value().unwrap(), Value::Null);
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::Int(5)).unwrap(), Some(5));
    }

    #[test]
    fn test_uuid_and_timestamp_as_text() {
        let id = Uuid::now_v7();
        let value = id.to_value().unwrap();
        assert!(matches!(value, Value::Text(_)));
        assert_eq!(Uuid::from_value(value).unwrap(), id);

        let now = DateTime::parse_from_rfc3339("2024-05-01T10:15:30Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(DateTime::<Utc>::from_value(now.to_value().unwrap()).unwrap(), now);
        assert!(DateTime::<Utc>::from_value(Value::Text("yesterday".into())).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "0xdead");
        assert_eq!(Value::Text("u1".into()).to_string(), "u1");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
