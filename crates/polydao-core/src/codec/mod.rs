//! Value model and codecs shared by every backend.
//!
//! Backend-specific encodings (SQL parameters, BSON) build on these types in
//! `polydao-storage`.

pub mod structured;
mod value;

pub use structured::Json;
pub use value::{CodecError, FieldType, FromValue, ToValue, Value};
