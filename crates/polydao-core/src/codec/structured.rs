//! Structured-text codec for nested field values.
//!
//! Values with no native backend representation are carried as canonical
//! JSON text. [`to_text`] and [`from_text`] are the only places that know the
//! text format.

use super::value::{CodecError, FromValue, ToValue, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::{Deref, DerefMut};

/// Encodes a value into its canonical structured text.
pub fn to_text<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value)
        .map_err(|e| CodecError::new(format!("cannot encode structured value: {e}")))
}

/// Parses structured text back into the declared target type.
pub fn from_text<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(|e| {
        CodecError::new(format!(
            "structured text does not match {}: {e}",
            std::any::type_name::<T>()
        ))
    })
}

/// Wrapper storing its contents through the structured-text codec.
///
/// ```
/// use polydao_core::{Json, ToValue, Value};
///
/// let value = Json(vec!["a", "b"]).to_value().unwrap();
/// assert_eq!(value, Value::Structured(r#"["a","b"]"#.to_string()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Returns the wrapped value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> Result<Value, CodecError> {
        to_text(&self.0).map(Value::Structured)
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    /// Decodes structured text. A stored null decodes as the text `null`,
    /// which backends without a structured null hand back as [`Value::Null`].
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Structured(text) => from_text(&text).map(Json),
            Value::Null => from_text("null").map(Json),
            other => Err(CodecError::mismatch("structured", &other)),
        }
    }
}
